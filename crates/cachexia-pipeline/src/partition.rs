//! Seeded train/test partitioning.

use cachexia_io::Label;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::frame::ModelFrame;
use crate::normalize::NormalizedTable;

/// Minimum rows per class the table must hold before splitting.
const MIN_ROWS_PER_CLASS: usize = 2;

/// Disjoint train and test row indices covering the whole table.
///
/// Both index lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Split {
    /// Row indices of the training partition.
    #[must_use]
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Row indices of the held-out partition.
    #[must_use]
    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Training rows of `frame`.
    #[must_use]
    pub fn train_frame(&self, frame: &ModelFrame) -> ModelFrame {
        frame.select(&self.train)
    }

    /// Held-out rows of `frame`.
    #[must_use]
    pub fn test_frame(&self, frame: &ModelFrame) -> ModelFrame {
        frame.select(&self.test)
    }
}

/// Number of training rows for `n` rows at `fraction`, kept in `[1, n - 1]`.
pub(crate) fn train_size(n: usize, fraction: f64) -> usize {
    let size = (n as f64 * fraction).round() as usize;
    size.clamp(1, n.saturating_sub(1).max(1))
}

/// Shuffle row order with `seed` and cut at `round(n * train_fraction)`.
///
/// The partition is not stratified. The same table, seed and fraction always
/// give the same indices.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::InvalidTrainFraction`] | `train_fraction` not in (0, 1) |
/// | [`PipelineError::InsufficientData`] | a class has fewer than 2 rows |
#[instrument(skip_all, fields(n_rows = table.n_rows(), seed = seed))]
pub fn split(
    table: &NormalizedTable,
    seed: u64,
    train_fraction: f64,
) -> Result<Split, PipelineError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(PipelineError::InvalidTrainFraction {
            fraction: train_fraction,
        });
    }
    for label in Label::ALL {
        let count = table.labels().iter().filter(|&&l| l == label).count();
        if count < MIN_ROWS_PER_CLASS {
            return Err(PipelineError::InsufficientData {
                stage: "split",
                label,
                count,
                required: MIN_ROWS_PER_CLASS,
            });
        }
    }

    let n = table.n_rows();
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let cut = train_size(n, train_fraction);
    let mut train = order[..cut].to_vec();
    let mut test = order[cut..].to_vec();
    train.sort_unstable();
    test.sort_unstable();

    info!(n_train = train.len(), n_test = test.len(), "table split");
    Ok(Split { train, test })
}
