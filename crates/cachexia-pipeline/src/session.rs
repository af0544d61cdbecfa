//! Memoized recomputation graph over one loaded dataset.
//!
//! ```text
//! WorkingTable ─ normalize ─ partition ─ recipe ─ model ─┬─ evaluation
//!                  (choice)    (choice)   (choice) (inputs) └─ cross-validation
//! ```
//!
//! Each node caches its last value under the inputs it depends on. Asking for
//! a node with the same inputs returns the cached `Arc`; different inputs
//! recompute it and every node downstream of it. Values are replaced, never
//! mutated, and failures are not cached.

use std::path::Path;
use std::sync::Arc;

use cachexia_io::{SampleReader, WorkingTable};
use tracing::{debug, info, instrument};

use crate::choice::NormalizationChoice;
use crate::config::PipelineConfig;
use crate::cv::CrossValidationResult;
use crate::error::PipelineError;
use crate::evaluate::{EvaluationResult, evaluate};
use crate::frame::ModelFrame;
use crate::normalize::{NormalizedTable, normalize};
use crate::partition::{Split, split};
use crate::recipe::{Recipe, RecipeSpec};
use crate::train::{ModelSpec, TrainedModel, TreeCount, train};

/// The two user-facing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Inputs {
    pub choice: NormalizationChoice,
    pub trees: TreeCount,
}

impl Inputs {
    #[must_use]
    pub fn new(choice: NormalizationChoice, trees: TreeCount) -> Self {
        Self { choice, trees }
    }
}

/// Split indices with the train and test frames they select.
#[derive(Debug, Clone)]
pub struct Partition {
    pub split: Split,
    pub train: ModelFrame,
    pub test: ModelFrame,
}

/// Every output of one generation. Each dependent output fails on its own.
#[derive(Debug)]
pub struct Report {
    pub generation: u64,
    pub inputs: Inputs,
    pub normalized: Result<Arc<NormalizedTable>, PipelineError>,
    pub partition: Result<Arc<Partition>, PipelineError>,
    pub recipe: Result<Arc<Recipe>, PipelineError>,
    pub model: Result<Arc<TrainedModel>, PipelineError>,
    pub evaluation: Result<Arc<EvaluationResult>, PipelineError>,
    pub cross_validation: Result<Arc<CrossValidationResult>, PipelineError>,
}

#[derive(Debug)]
struct Memo<K, V> {
    key: K,
    value: Arc<V>,
}

fn memoize<K, V>(
    slot: &mut Option<Memo<K, V>>,
    node: &'static str,
    key: K,
    compute: impl FnOnce() -> Result<V, PipelineError>,
) -> Result<Arc<V>, PipelineError>
where
    K: PartialEq + Copy,
{
    if let Some(memo) = slot.as_ref().filter(|m| m.key == key) {
        debug!(node, "reusing cached value");
        return Ok(Arc::clone(&memo.value));
    }
    let value = Arc::new(compute()?);
    *slot = Some(Memo {
        key,
        value: Arc::clone(&value),
    });
    Ok(value)
}

/// One analyst session over an immutable dataset.
#[derive(Debug)]
pub struct Session {
    table: Arc<WorkingTable>,
    config: PipelineConfig,
    generation: u64,
    current: Option<Inputs>,
    normalized: Option<Memo<NormalizationChoice, NormalizedTable>>,
    partition: Option<Memo<NormalizationChoice, Partition>>,
    recipe: Option<Memo<NormalizationChoice, Recipe>>,
    model: Option<Memo<Inputs, TrainedModel>>,
    evaluation: Option<Memo<Inputs, EvaluationResult>>,
    cross_validation: Option<Memo<Inputs, CrossValidationResult>>,
}

impl Session {
    /// Start a session over `table`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting reported by [`PipelineConfig::validate`].
    pub fn new(
        table: impl Into<Arc<WorkingTable>>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            table: table.into(),
            config,
            generation: 0,
            current: None,
            normalized: None,
            partition: None,
            recipe: None,
            model: None,
            evaluation: None,
            cross_validation: None,
        })
    }

    /// Load the dataset once with the default reader settings and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the file cannot be read or validated,
    /// or a configuration error.
    pub fn open(path: &Path, config: PipelineConfig) -> Result<Self, PipelineError> {
        let table = SampleReader::new(path).read()?;
        Self::new(table, config)
    }

    #[must_use]
    pub fn table(&self) -> &WorkingTable {
        &self.table
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of distinct input combinations requested so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Normalized table for `choice`.
    ///
    /// # Errors
    ///
    /// See [`normalize`].
    pub fn normalized(
        &mut self,
        choice: NormalizationChoice,
    ) -> Result<Arc<NormalizedTable>, PipelineError> {
        let table = Arc::clone(&self.table);
        memoize(&mut self.normalized, "normalize", choice, || {
            normalize(&table, choice)
        })
    }

    /// Train/test partition of the normalized table.
    ///
    /// # Errors
    ///
    /// Propagates normalization errors, then see [`split`].
    pub fn partition(
        &mut self,
        choice: NormalizationChoice,
    ) -> Result<Arc<Partition>, PipelineError> {
        let normalized = self.normalized(choice)?;
        let (seed, fraction) = (self.config.seed(), self.config.train_fraction());
        memoize(&mut self.partition, "partition", choice, || {
            let split = split(&normalized, seed, fraction)?;
            let frame = normalized.frame();
            Ok(Partition {
                train: split.train_frame(&frame),
                test: split.test_frame(&frame),
                split,
            })
        })
    }

    /// Recipe fit on the training partition.
    ///
    /// # Errors
    ///
    /// Propagates partition errors.
    pub fn recipe(&mut self, choice: NormalizationChoice) -> Result<Arc<Recipe>, PipelineError> {
        let partition = self.partition(choice)?;
        memoize(&mut self.recipe, "recipe", choice, || {
            RecipeSpec::for_choice(choice).fit(&partition.train)
        })
    }

    /// Forest trained behind the recipe.
    ///
    /// # Errors
    ///
    /// Propagates recipe errors, then see [`train`].
    pub fn model(&mut self, inputs: Inputs) -> Result<Arc<TrainedModel>, PipelineError> {
        let recipe = self.recipe(inputs.choice)?;
        let partition = self.partition(inputs.choice)?;
        let spec = ModelSpec::new(inputs.trees).with_seed(self.config.seed());
        memoize(&mut self.model, "model", inputs, || {
            train(&recipe, &partition.train, &spec)
        })
    }

    /// Held-out evaluation of the model.
    ///
    /// # Errors
    ///
    /// Propagates model errors, then see [`evaluate`].
    pub fn evaluation(&mut self, inputs: Inputs) -> Result<Arc<EvaluationResult>, PipelineError> {
        let model = self.model(inputs)?;
        let recipe = self.recipe(inputs.choice)?;
        let partition = self.partition(inputs.choice)?;
        let vip_count = self.config.vip_count();
        memoize(&mut self.evaluation, "evaluation", inputs, || {
            evaluate(&model, &recipe, &partition.test, vip_count)
        })
    }

    /// Cross-validation of recipe and forest on the training partition.
    ///
    /// Independent of the fitted model; this is the slowest node and runs
    /// to completion once started.
    ///
    /// # Errors
    ///
    /// Propagates partition errors, then see
    /// [`CrossValidation::run`](crate::CrossValidation::run).
    pub fn cross_validation(
        &mut self,
        inputs: Inputs,
    ) -> Result<Arc<CrossValidationResult>, PipelineError> {
        let partition = self.partition(inputs.choice)?;
        let cv = self.config.cross_validation()?;
        let spec = ModelSpec::new(inputs.trees).with_seed(self.config.seed());
        memoize(&mut self.cross_validation, "cross-validation", inputs, || {
            cv.run(&RecipeSpec::for_choice(inputs.choice), &spec, &partition.train)
        })
    }

    /// Compute every output for `inputs`.
    ///
    /// Inputs that differ from the previous request open a new generation.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn report(&mut self, inputs: Inputs) -> Report {
        if self.current != Some(inputs) {
            self.generation += 1;
            self.current = Some(inputs);
            info!(
                generation = self.generation,
                choice = %inputs.choice,
                trees = inputs.trees.get(),
                "inputs changed; new generation"
            );
        }
        Report {
            generation: self.generation,
            inputs,
            normalized: self.normalized(inputs.choice),
            partition: self.partition(inputs.choice),
            recipe: self.recipe(inputs.choice),
            model: self.model(inputs),
            evaluation: self.evaluation(inputs),
            cross_validation: self.cross_validation(inputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachexia_io::{Label, Metabolite, SampleId, TimePoint};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn table(n: usize) -> WorkingTable {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let labels: Vec<Label> = (0..n).map(|i| Label::from_index(i % 2)).collect();
        let ids = (0..n).map(|i| SampleId::new(format!("NETL_{i:03}_V1"))).collect();
        let metabolites = (0..4)
            .map(|m| {
                let values = labels
                    .iter()
                    .map(|l| {
                        let shift = if m == 0 { l.index() as f64 * 40.0 } else { 0.0 };
                        10.0 + shift + rng.gen_range(0.0..20.0)
                    })
                    .collect();
                Metabolite::new(format!("m{m}"), values)
            })
            .collect();
        WorkingTable::new(ids, labels, vec![Some(TimePoint::Day0); n], metabolites).unwrap()
    }

    fn session(n: usize, folds: usize) -> Session {
        Session::new(table(n), PipelineConfig::default().with_folds(folds)).unwrap()
    }

    #[test]
    fn same_inputs_reuse_every_node() {
        let mut s = session(40, 3);
        let inputs = Inputs::default();
        let a = s.report(inputs);
        let b = s.report(inputs);
        assert_eq!(a.generation, 1);
        assert_eq!(b.generation, 1);
        assert!(Arc::ptr_eq(a.model.as_ref().unwrap(), b.model.as_ref().unwrap()));
        assert!(Arc::ptr_eq(
            a.cross_validation.as_ref().unwrap(),
            b.cross_validation.as_ref().unwrap()
        ));
    }

    #[test]
    fn tree_change_keeps_upstream_nodes() {
        let mut s = session(40, 3);
        let first = s.report(Inputs::default());
        let more_trees = Inputs::new(NormalizationChoice::default(), TreeCount::new(20).unwrap());
        let second = s.report(more_trees);
        assert_eq!(second.generation, 2);
        assert!(Arc::ptr_eq(
            first.normalized.as_ref().unwrap(),
            second.normalized.as_ref().unwrap()
        ));
        assert!(Arc::ptr_eq(first.recipe.as_ref().unwrap(), second.recipe.as_ref().unwrap()));
        assert!(!Arc::ptr_eq(first.model.as_ref().unwrap(), second.model.as_ref().unwrap()));
    }

    #[test]
    fn choice_change_recomputes_chain() {
        let mut s = session(40, 3);
        let a = s.report(Inputs::default());
        let b = s.report(Inputs::new(NormalizationChoice::Log2Pareto, TreeCount::default()));
        assert!(!Arc::ptr_eq(a.normalized.as_ref().unwrap(), b.normalized.as_ref().unwrap()));
        assert_eq!(b.normalized.as_ref().unwrap().choice(), NormalizationChoice::Log2Pareto);
        assert!(b.recipe.as_ref().unwrap().steps().is_empty());
    }

    #[test]
    fn results_match_a_fresh_session() {
        let inputs = Inputs::new(NormalizationChoice::NormalizeCenter, TreeCount::new(15).unwrap());
        let mut warm = session(40, 3);
        warm.report(Inputs::default());
        let warm_eval = warm.report(inputs).evaluation.unwrap();
        let cold_eval = session(40, 3).report(inputs).evaluation.unwrap();
        assert_eq!(warm_eval.predictions, cold_eval.predictions);
        assert_eq!(warm_eval.confusion, cold_eval.confusion);
    }

    #[test]
    fn failing_node_leaves_others_usable() {
        // 30 rows give 24 training rows, about 12 per class: too few for 20 folds.
        let mut s = session(30, 20);
        let report = s.report(Inputs::default());
        assert!(report.normalized.is_ok());
        assert!(report.evaluation.is_ok());
        assert!(matches!(
            report.cross_validation,
            Err(PipelineError::InsufficientData { stage: "cross-validation", .. })
        ));
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Session::new(table(10), PipelineConfig::default().with_vip_count(0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidVipCount { .. }));
    }
}
