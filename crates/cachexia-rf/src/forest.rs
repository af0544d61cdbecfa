//! Bootstrap random forest training with parallel tree construction.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::ForestError;
use crate::importance::{RankedFeature, rank_importances};
use crate::tree::{DecisionTree, TreeParams};

/// A fitted random forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// A trained forest together with its impurity importance ranking.
#[derive(Debug, Clone)]
pub struct FittedForest {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    n_samples: usize,
    max_features: usize,
}

impl FittedForest {
    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Features ranked by mean decrease in Gini impurity, most important first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// Number of training samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of features drawn at each split.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }
}

fn validate(
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    feature_names: &[String],
) -> Result<usize, ForestError> {
    let Some(first) = features.first() else {
        return Err(ForestError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if labels.len() != features.len() {
        return Err(ForestError::LabelCountMismatch {
            labels: labels.len(),
            samples: features.len(),
        });
    }
    if feature_names.len() != n_features {
        return Err(ForestError::FeatureNameMismatch {
            names: feature_names.len(),
            n_features,
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }

    let mut seen = vec![false; n_classes];
    for (sample_index, &label) in labels.iter().enumerate() {
        if label >= n_classes {
            return Err(ForestError::LabelOutOfRange {
                label,
                n_classes,
                sample_index,
            });
        }
        seen[label] = true;
    }
    let n_distinct = seen.iter().filter(|&&s| s).count();
    if n_distinct < 2 {
        return Err(ForestError::SingleClass { n_distinct });
    }
    Ok(n_features)
}

/// Draw `n` indices uniformly with replacement.
fn bootstrap(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    feature_names: &[String],
) -> Result<FittedForest, ForestError> {
    let n_features = validate(features, labels, n_classes, feature_names)?;
    let n_samples = features.len();

    if config.max_depth == Some(0) {
        return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_leaf == 0 {
        return Err(ForestError::InvalidMinSamplesLeaf { min_samples_leaf: 0 });
    }
    let max_features = config.max_features.resolve(n_features)?;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        max_features,
        "training random forest"
    );

    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let max_depth = config.max_depth;
    let min_samples_leaf = config.min_samples_leaf;
    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let drawn = bootstrap(n_samples, &mut rng);
            let params = TreeParams {
                max_depth,
                min_samples_leaf,
                max_features,
                seed: rng.r#gen(),
            };
            DecisionTree::grow(&columns, labels, &drawn, n_classes, params)
        })
        .collect();

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::impurity_decrease).collect();
    let importances = rank_importances(&per_tree, feature_names);
    debug!(
        top_feature = importances.first().map(|f| f.name.as_str()),
        "importances aggregated"
    );

    Ok(FittedForest {
        forest: RandomForest {
            trees,
            n_features,
            n_classes,
            feature_names: feature_names.to_vec(),
        },
        importances,
        n_samples,
        max_features,
    })
}
