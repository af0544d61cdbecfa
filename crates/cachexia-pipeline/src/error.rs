//! Error types for cachexia-pipeline.

use cachexia_io::{IoError, Label};
use cachexia_rf::ForestError;

/// Errors raised while building or evaluating a pipeline generation.
///
/// [`PipelineError::DataShape`] and [`PipelineError::Io`] are fatal for the
/// dataset. The rest only fail the current generation: a different
/// normalization choice or tree count may succeed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Returned when the dataset cannot be modeled at all.
    #[error("cannot build model: {reason}")]
    DataShape {
        /// Human-readable description.
        reason: String,
    },

    /// Returned when loading or assembling a table fails.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Returned when a normalization label is not one of the four strategies.
    #[error("unknown normalization \"{raw}\"; expected one of: {expected}")]
    UnknownNormalization {
        /// The text that failed to parse.
        raw: String,
        /// Comma-separated list of accepted labels.
        expected: String,
    },

    /// Returned when a partition or fold holds too few rows of a class.
    #[error("{stage}: {count} {label} row(s), need at least {required}")]
    InsufficientData {
        /// Where the shortage was found (`split`, `cross-validation`, ...).
        stage: &'static str,
        /// The short class.
        label: Label,
        /// Rows of that class available.
        count: usize,
        /// Rows of that class required.
        required: usize,
    },

    /// Returned when the held-out partition is empty.
    #[error("{stage}: no rows to evaluate")]
    EmptyPartition {
        /// Where the empty partition was found.
        stage: &'static str,
    },

    /// Returned when the random forest cannot be fit or queried.
    #[error("model training failed")]
    Training(#[from] ForestError),

    /// Returned when a tree count is outside 5..=100 or not a multiple of 5.
    #[error("tree count must be a multiple of 5 in [5, 100], got {n_trees}")]
    InvalidTreeCount {
        /// The rejected value.
        n_trees: usize,
    },

    /// Returned when the train fraction is outside the open interval (0, 1).
    #[error("train fraction must be in (0, 1), got {fraction}")]
    InvalidTrainFraction {
        /// The rejected value.
        fraction: f64,
    },

    /// Returned when fewer than two cross-validation folds are requested.
    #[error("cross-validation needs at least 2 folds, got {n_folds}")]
    InvalidFoldCount {
        /// The rejected value.
        n_folds: usize,
    },

    /// Returned when the VIP list length is zero.
    #[error("vip_count must be at least 1, got {vip_count}")]
    InvalidVipCount {
        /// The rejected value.
        vip_count: usize,
    },

    /// Returned when a fitted recipe is applied to a frame with other columns.
    #[error("recipe was fit on columns {expected:?} but frame has {got:?}")]
    RecipeMismatch {
        /// Columns seen at fit time.
        expected: Vec<String>,
        /// Columns of the frame being transformed.
        got: Vec<String>,
    },
}
