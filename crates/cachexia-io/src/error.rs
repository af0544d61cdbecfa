//! I/O and data-shape error types for cachexia-io.

use std::path::PathBuf;

/// Errors from reading and validating the metabolite dataset.
///
/// Everything past [`IoError::CsvParse`] describes a dataset whose shape the
/// pipeline cannot model; those are fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header lacks the identifier and label columns.
    #[error("header has {got} columns; need sample id, label, {auxiliary} auxiliary column(s) and at least one metabolite")]
    MissingColumns {
        /// Number of header columns found.
        got: usize,
        /// Number of auxiliary columns the reader was told to skip.
        auxiliary: usize,
    },

    /// Returned when a table is built without any metabolite column.
    #[error("table has no metabolite columns")]
    NoMetabolites,

    /// Returned when the file has a header but no data rows.
    #[error("empty dataset (no data rows)")]
    EmptyDataset,

    /// Returned when a data row has a different number of columns than the header.
    #[error("row {row_index} (sample {sample_id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Sample identifier of the offending row.
        sample_id: String,
        /// Expected number of columns.
        expected: usize,
        /// Actual number of columns.
        got: usize,
    },

    /// Returned when a sample identifier cell is blank.
    #[error("row {row_index} has an empty sample identifier")]
    EmptySampleId {
        /// Zero-based row index (excluding header).
        row_index: usize,
    },

    /// Returned when the same sample identifier appears twice.
    #[error("duplicate sample id \"{sample_id}\": first at row {first_row}, again at row {second_row}")]
    DuplicateSampleId {
        /// The duplicated identifier.
        sample_id: String,
        /// Zero-based row of the first occurrence.
        first_row: usize,
        /// Zero-based row of the second occurrence.
        second_row: usize,
    },

    /// Returned when a label is neither `control` nor `cachexic`.
    #[error("row {row_index}: unknown label \"{raw}\" (expected control or cachexic)")]
    UnknownLabel {
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw label text.
        raw: String,
    },

    /// Returned when a concentration is unparseable, NaN or infinite.
    #[error("row {row_index}, metabolite \"{column}\": non-finite value \"{raw}\"")]
    NonFiniteValue {
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Metabolite column name (after renaming).
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when a concentration is below zero.
    #[error("row {row_index}, metabolite \"{column}\": negative concentration {value}")]
    NegativeConcentration {
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Metabolite column name (after renaming).
        column: String,
        /// The offending value.
        value: f64,
    },

    /// Returned when two headers collapse to the same canonical name.
    #[error("headers \"{first}\" and \"{second}\" both rename to \"{canonical}\"")]
    DuplicateColumn {
        /// First original header.
        first: String,
        /// Second original header.
        second: String,
        /// Shared canonical name.
        canonical: String,
    },

    /// Returned when a header renames to an empty identifier.
    #[error("header \"{raw}\" has no alphanumeric characters")]
    BlankColumnName {
        /// The original header text.
        raw: String,
    },

    /// Returned when the label column holds fewer than two classes.
    #[error("label column has {n_classes} class(es); need both control and cachexic")]
    TooFewClasses {
        /// Number of distinct classes present.
        n_classes: usize,
    },

    /// Returned when the columns of a table have different lengths.
    #[error("column \"{column}\" has {got} rows, expected {expected}")]
    RaggedTable {
        /// Offending column.
        column: String,
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        got: usize,
    },
}
