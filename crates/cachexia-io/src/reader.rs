//! CSV sample reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{Label, Metabolite, SampleId, WorkingTable};
use crate::time_points::TimePointRules;

/// Rename a header to a snake_case identifier.
///
/// Lowercases, collapses each run of non-alphanumeric characters into one
/// `_`, trims leading/trailing `_`, and prefixes `x` when the result starts
/// with a digit. Returns `None` when nothing alphanumeric remains.
#[must_use]
pub fn canonical_name(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'x');
    }
    Some(out)
}

/// Reads the metabolite dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required
/// - `sample_id,label,<auxiliary...>,metabolite_1,...,metabolite_n`
/// - One row per sample; all rows have the header's column count
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumns`] | Header too short for id, label, auxiliaries and one metabolite |
/// | [`IoError::BlankColumnName`] / [`IoError::DuplicateColumn`] | Header renaming fails |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptySampleId`] / [`IoError::DuplicateSampleId`] | Bad identifier |
/// | [`IoError::UnknownLabel`] | Label is not control/cachexic |
/// | [`IoError::NonFiniteValue`] / [`IoError::NegativeConcentration`] | Bad concentration |
/// | [`IoError::TooFewClasses`] | Only one label present |
pub struct SampleReader {
    path: PathBuf,
    auxiliary_columns: usize,
    rules: TimePointRules,
}

impl SampleReader {
    /// Create a reader for the given CSV path with one auxiliary column.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            auxiliary_columns: 1,
            rules: TimePointRules::default(),
        }
    }

    /// Set how many columns between the label and the first metabolite are skipped.
    #[must_use]
    pub fn with_auxiliary_columns(mut self, auxiliary_columns: usize) -> Self {
        self.auxiliary_columns = auxiliary_columns;
        self
    }

    /// Replace the `time_points` derivation rules.
    #[must_use]
    pub fn with_time_point_rules(mut self, rules: TimePointRules) -> Self {
        self.rules = rules;
        self
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn metabolite_names(&self, header: &csv::StringRecord) -> Result<Vec<String>, IoError> {
        let first = 2 + self.auxiliary_columns;
        if header.len() <= first {
            return Err(IoError::MissingColumns {
                got: header.len(),
                auxiliary: self.auxiliary_columns,
            });
        }
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut names = Vec::with_capacity(header.len() - first);
        for raw in header.iter().skip(first) {
            let canonical = canonical_name(raw).ok_or_else(|| IoError::BlankColumnName {
                raw: raw.to_string(),
            })?;
            if let Some(first) = seen.insert(canonical.clone(), raw) {
                return Err(IoError::DuplicateColumn {
                    first: first.to_string(),
                    second: raw.to_string(),
                    canonical,
                });
            }
            names.push(canonical);
        }
        Ok(names)
    }

    /// Read and validate the CSV file, returning a [`WorkingTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<WorkingTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that ragged rows surface as InconsistentRowLength.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let names = self.metabolite_names(&header)?;
        let expected_cols = header.len();
        let first_metabolite = 2 + self.auxiliary_columns;
        debug!(expected_cols, n_metabolites = names.len(), "read CSV header");

        let mut sample_ids = Vec::new();
        let mut labels = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let id = record.get(0).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    row_index,
                    sample_id: id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }
            if id.is_empty() {
                return Err(IoError::EmptySampleId { row_index });
            }
            if let Some(&first_row) = seen.get(&id) {
                return Err(IoError::DuplicateSampleId {
                    sample_id: id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(id.clone(), row_index);

            let raw_label = record.get(1).unwrap_or("");
            let label = Label::parse(raw_label).ok_or_else(|| IoError::UnknownLabel {
                row_index,
                raw: raw_label.to_string(),
            })?;

            for (col, (name, column)) in names.iter().zip(columns.iter_mut()).enumerate() {
                let raw = record.get(first_metabolite + col).unwrap_or("");
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        row_index,
                        column: name.clone(),
                        raw: raw.to_string(),
                    })?;
                if value < 0.0 {
                    return Err(IoError::NegativeConcentration {
                        row_index,
                        column: name.clone(),
                        value,
                    });
                }
                column.push(value);
            }

            sample_ids.push(SampleId::new(id));
            labels.push(label);
        }

        if sample_ids.is_empty() {
            return Err(IoError::EmptyDataset);
        }

        let time_points = sample_ids.iter().map(|id| self.rules.derive(id)).collect();
        let metabolites = names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Metabolite::new(name, values))
            .collect();

        let table = WorkingTable::new(sample_ids, labels, time_points, metabolites)?;
        let [n_control, n_cachexic] = table.class_counts();
        info!(
            n_rows = table.n_rows(),
            n_metabolites = table.n_metabolites(),
            n_control,
            n_cachexic,
            "dataset loaded"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimePoint;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    const HEADER: &str = "Patient ID,Muscle loss,Age,1.6-Anhydro-beta-D-glucose,Creatinine,Glycine\n";

    fn read(body: &str) -> Result<WorkingTable, IoError> {
        let f = write_csv(&format!("{HEADER}{body}"));
        SampleReader::new(f.path()).read()
    }

    #[test]
    fn canonical_names() {
        assert_eq!(
            canonical_name("1.6-Anhydro-beta-D-glucose").as_deref(),
            Some("x1_6_anhydro_beta_d_glucose")
        );
        assert_eq!(canonical_name("  N,N-Dimethylglycine ").as_deref(), Some("n_n_dimethylglycine"));
        assert_eq!(canonical_name("cis-Aconitate").as_deref(), Some("cis_aconitate"));
        assert_eq!(canonical_name("--"), None);
    }

    #[test]
    fn reads_valid_table() {
        let table = read(
            "PIF_178,cachexic,61,40.85,7088.1,178.2\n\
             NETL_005_V1,control,55,11.02,3498.9,59.1\n\
             NETL_005_V2,Control,55,12.18,4255.6,71.6\n\
             NETCR_015,cachexic,70,3.1,1900.0,12.0\n",
        )
        .unwrap();
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.n_metabolites(), 3);
        assert_eq!(table.metabolites()[0].name, "x1_6_anhydro_beta_d_glucose");
        assert_eq!(table.metabolites()[1].values, vec![7088.1, 3498.9, 4255.6, 1900.0]);
        assert_eq!(table.labels()[2], Label::Control);
        assert_eq!(
            table.time_points(),
            &[
                Some(TimePoint::Day0),
                Some(TimePoint::Day0),
                Some(TimePoint::Day100),
                None
            ]
        );
    }

    #[test]
    fn auxiliary_column_count_is_configurable() {
        let f = write_csv("id,label,a,b\nS1,control,1.0,2.0\nS2,cachexic,3.0,4.0\n");
        let table = SampleReader::new(f.path())
            .with_auxiliary_columns(0)
            .read()
            .unwrap();
        assert_eq!(table.n_metabolites(), 2);
        assert_eq!(table.metabolites()[0].name, "a");
    }

    #[test]
    fn error_file_not_found() {
        let result = SampleReader::new(Path::new("/nonexistent/cachexia.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_missing_columns() {
        let f = write_csv("Patient ID,Muscle loss,Age\nP1,control,40\n");
        let result = SampleReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::MissingColumns { got: 3, auxiliary: 1 })));
    }

    #[test]
    fn error_empty_dataset() {
        assert!(matches!(read(""), Err(IoError::EmptyDataset)));
    }

    #[test]
    fn error_unknown_label() {
        let result = read("P1,cachexia,1,1.0,2.0,3.0\n");
        assert!(matches!(result, Err(IoError::UnknownLabel { row_index: 0, .. })));
    }

    #[test]
    fn error_single_class() {
        let result = read("P1,control,1,1.0,2.0,3.0\nP2,control,1,1.0,2.0,3.0\n");
        assert!(matches!(result, Err(IoError::TooFewClasses { n_classes: 1 })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let result = read("P1,control,1,1.0,2.0,3.0\nP2,cachexic,1,1.0\n");
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength { row_index: 1, .. })
        ));
    }

    #[test]
    fn error_non_finite_and_negative() {
        assert!(matches!(
            read("P1,control,1,NaN,2.0,3.0\n"),
            Err(IoError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            read("P1,control,1,abc,2.0,3.0\n"),
            Err(IoError::NonFiniteValue { .. })
        ));
        assert!(matches!(
            read("P1,control,1,1.0,-2.0,3.0\n"),
            Err(IoError::NegativeConcentration { ref column, .. }) if column == "creatinine"
        ));
    }

    #[test]
    fn error_duplicate_sample_id() {
        let result = read("P1,control,1,1,2,3\nP2,cachexic,1,1,2,3\nP1,cachexic,1,1,2,3\n");
        assert!(matches!(
            result,
            Err(IoError::DuplicateSampleId {
                first_row: 0,
                second_row: 2,
                ..
            })
        ));
    }

    #[test]
    fn error_duplicate_renamed_column() {
        let f = write_csv("id,label,aux,Glycine,glycine\nP1,control,1,1,2\n");
        let result = SampleReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::DuplicateColumn { .. })));
    }
}
