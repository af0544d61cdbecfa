//! Session-wide settings that are not user-facing controls.

use crate::cv::CrossValidation;
use crate::error::PipelineError;

/// Fixed settings shared by every generation of a [`Session`](crate::Session).
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `seed`           | 1337    |
/// | `n_folds`        | 10      |
/// | `train_fraction` | 0.8     |
/// | `vip_count`      | 10      |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    seed: u64,
    n_folds: usize,
    train_fraction: f64,
    vip_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            n_folds: 10,
            train_fraction: 0.8,
            vip_count: 10,
        }
    }
}

impl PipelineConfig {
    /// Default settings with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Set the number of cross-validation folds.
    #[must_use]
    pub fn with_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the share of rows used for training.
    #[must_use]
    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    /// Set how many top features the VIP ranking keeps.
    #[must_use]
    pub fn with_vip_count(mut self, vip_count: usize) -> Self {
        self.vip_count = vip_count;
        self
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    #[must_use]
    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    #[must_use]
    pub fn vip_count(&self) -> usize {
        self.vip_count
    }

    /// The cross-validation settings implied by this config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFoldCount`] if fewer than 2 folds.
    pub fn cross_validation(&self) -> Result<CrossValidation, PipelineError> {
        Ok(CrossValidation::new(self.n_folds)?.with_seed(self.seed))
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PipelineError::InvalidFoldCount`] | `n_folds` < 2 |
    /// | [`PipelineError::InvalidTrainFraction`] | `train_fraction` not in (0, 1) |
    /// | [`PipelineError::InvalidVipCount`] | `vip_count` is zero |
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.cross_validation()?;
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::InvalidTrainFraction {
                fraction: self.train_fraction,
            });
        }
        if self.vip_count == 0 {
            return Err(PipelineError::InvalidVipCount {
                vip_count: self.vip_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.seed(), 1337);
        assert_eq!(c.n_folds(), 10);
        assert!((c.train_fraction() - 0.8).abs() < f64::EPSILON);
        assert_eq!(c.vip_count(), 10);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let c = PipelineConfig::new(7)
            .with_folds(5)
            .with_train_fraction(0.75)
            .with_vip_count(3);
        assert_eq!(c.seed(), 7);
        assert_eq!(c.cross_validation().unwrap().n_folds(), 5);
        assert_eq!(c.cross_validation().unwrap().seed(), 7);
        assert_eq!(c.vip_count(), 3);
    }

    #[test]
    fn invalid_fields_rejected() {
        assert!(matches!(
            PipelineConfig::default().with_folds(1).validate(),
            Err(PipelineError::InvalidFoldCount { n_folds: 1 })
        ));
        assert!(matches!(
            PipelineConfig::default().with_train_fraction(1.5).validate(),
            Err(PipelineError::InvalidTrainFraction { .. })
        ));
        assert!(matches!(
            PipelineConfig::default().with_vip_count(0).validate(),
            Err(PipelineError::InvalidVipCount { vip_count: 0 })
        ));
    }
}
