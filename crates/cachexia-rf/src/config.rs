//! Configuration builder for random forest training.

use crate::error::ForestError;
use crate::forest::FittedForest;

/// Strategy for the number of features drawn at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// A fixed count.
    Fixed(usize),
    /// Every feature at every split.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete feature count for a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidMaxFeatures`] when the count is 0 or larger
    /// than `n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, ForestError> {
        let resolved = match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for random forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `max_features`     | `Sqrt`  |
/// | `max_depth`        | `None`  |
/// | `min_samples_leaf` | 1       |
/// | `seed`             | 42      |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_leaf: usize,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a config that grows `n_trees` trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_leaf: 1,
            seed: 42,
        })
    }

    /// Set the per-split feature sampling strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` grows until leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples in each leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the master seed; per-tree seeds are derived from it.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the feature sampling strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum leaf size.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a forest on a row-major dataset.
    ///
    /// `features[sample][feature]`, `labels[sample]` in `[0, n_classes)`,
    /// one name per feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                            |
    /// |----------------------------------------|-------------------------------------------------|
    /// | [`ForestError::EmptyDataset`]          | `features` is empty                             |
    /// | [`ForestError::ZeroFeatures`]          | rows have no columns                            |
    /// | [`ForestError::LabelCountMismatch`]    | `labels.len() != features.len()`                |
    /// | [`ForestError::FeatureNameMismatch`]   | `feature_names.len()` differs from column count |
    /// | [`ForestError::FeatureCountMismatch`]  | ragged rows                                     |
    /// | [`ForestError::NonFiniteValue`]        | any value is NaN or infinite                    |
    /// | [`ForestError::LabelOutOfRange`]       | a label is `>= n_classes`                       |
    /// | [`ForestError::SingleClass`]           | fewer than two distinct labels                  |
    /// | [`ForestError::InvalidMaxFeatures`]    | `max_features` resolves outside `[1, p]`        |
    /// | [`ForestError::InvalidMaxDepth`]       | `max_depth` is `Some(0)`                        |
    /// | [`ForestError::InvalidMinSamplesLeaf`] | `min_samples_leaf` is zero                      |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        feature_names: &[String],
    ) -> Result<FittedForest, ForestError> {
        crate::forest::train(self, features, labels, n_classes, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_rounds_down() {
        assert_eq!(MaxFeatures::Sqrt.resolve(63).unwrap(), 7);
        assert_eq!(MaxFeatures::Sqrt.resolve(64).unwrap(), 8);
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
    }

    #[test]
    fn fixed_outside_range_rejected() {
        assert!(matches!(
            MaxFeatures::Fixed(0).resolve(4),
            Err(ForestError::InvalidMaxFeatures { .. })
        ));
        assert!(MaxFeatures::Fixed(5).resolve(4).is_err());
        assert_eq!(MaxFeatures::All.resolve(4).unwrap(), 4);
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            ForestConfig::new(0),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn builder_sets_fields() {
        let config = ForestConfig::new(25)
            .unwrap()
            .with_max_depth(Some(4))
            .with_min_samples_leaf(2)
            .with_max_features(MaxFeatures::All)
            .with_seed(7);
        assert_eq!(config.n_trees(), 25);
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.min_samples_leaf(), 2);
        assert_eq!(config.max_features(), MaxFeatures::All);
        assert_eq!(config.seed(), 7);
    }
}
