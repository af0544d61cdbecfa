//! Random forest fitting on recipe-transformed training rows.

use std::fmt;

use cachexia_io::Label;
use cachexia_rf::{ClassProbabilities, FittedForest, ForestConfig, RankedFeature};
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::frame::ModelFrame;
use crate::recipe::Recipe;

/// Number of trees: a multiple of 5 in `[5, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeCount(usize);

impl TreeCount {
    /// Smallest accepted count.
    pub const MIN: usize = 5;
    /// Largest accepted count.
    pub const MAX: usize = 100;
    /// Accepted counts are multiples of this.
    pub const STEP: usize = 5;

    /// Validate a tree count.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTreeCount`] outside the range or off-step.
    pub fn new(n_trees: usize) -> Result<Self, PipelineError> {
        if !(Self::MIN..=Self::MAX).contains(&n_trees) || n_trees % Self::STEP != 0 {
            return Err(PipelineError::InvalidTreeCount { n_trees });
        }
        Ok(Self(n_trees))
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TreeCount {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for TreeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Forest hyperparameters for one fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    trees: TreeCount,
    seed: u64,
}

impl ModelSpec {
    #[must_use]
    pub fn new(trees: TreeCount) -> Self {
        Self { trees, seed: 1337 }
    }

    /// Set the seed the forest's bootstrap draws descend from.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn trees(&self) -> TreeCount {
        self.trees
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn forest_config(&self) -> Result<ForestConfig, PipelineError> {
        Ok(ForestConfig::new(self.trees.get())?.with_seed(self.seed))
    }
}

/// A fitted classification forest and the spec it was trained with.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    fitted: FittedForest,
    spec: ModelSpec,
}

impl TrainedModel {
    /// Impurity importances, most important first, summing to 1.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        self.fitted.importances()
    }

    /// The first `n` entries of [`TrainedModel::importances`].
    #[must_use]
    pub fn vip(&self, n: usize) -> &[RankedFeature] {
        let all = self.fitted.importances();
        &all[..n.min(all.len())]
    }

    #[must_use]
    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    /// Feature names in model input order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.fitted.forest().feature_names()
    }

    #[must_use]
    pub fn n_train(&self) -> usize {
        self.fitted.n_samples()
    }

    /// Class probabilities for every row of an already-transformed frame.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Training`] if the frame width differs from the model's.
    pub fn predict_proba(&self, frame: &ModelFrame) -> Result<Vec<ClassProbabilities>, PipelineError> {
        Ok(self
            .fitted
            .forest()
            .predict_proba_batch(&frame.feature_rows())?)
    }

    /// Short human-readable summary.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "random forest (classification): {} trees, {} features ({} tried per split), impurity importance, {} training rows",
            self.spec.trees,
            self.feature_names().len(),
            self.fitted.max_features(),
            self.fitted.n_samples()
        )
    }
}

/// Fit a forest on `train` after transforming it with `recipe`.
///
/// Features are the encoded `time_points` factor plus every metabolite the
/// recipe kept.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::RecipeMismatch`] | `train` columns differ from the recipe's |
/// | [`PipelineError::Training`] | fewer than two classes, non-finite features, or another forest error |
#[instrument(skip_all, fields(n_trees = spec.trees.get(), n_train = train.n_rows()))]
pub fn train(
    recipe: &Recipe,
    train: &ModelFrame,
    spec: &ModelSpec,
) -> Result<TrainedModel, PipelineError> {
    let prepared = recipe.apply(train)?;
    let fitted = spec.forest_config()?.fit(
        &prepared.feature_rows(),
        &prepared.label_indices(),
        Label::ALL.len(),
        &prepared.feature_names(),
    )?;
    info!(
        top_feature = fitted.importances().first().map(|f| f.name.as_str()),
        "model trained"
    );
    Ok(TrainedModel {
        fitted,
        spec: *spec,
    })
}
