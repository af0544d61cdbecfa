//! Stratified k-fold cross-validation of the recipe and forest together.

use cachexia_io::Label;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::PipelineError;
use crate::evaluate::evaluate;
use crate::frame::ModelFrame;
use crate::metrics::{MetricName, Metrics};
use crate::recipe::RecipeSpec;
use crate::train::{ModelSpec, train};

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
}

/// Mean and standard error of one metric across folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub metric: MetricName,
    pub mean: f64,
    /// Sample SD of the fold values divided by `sqrt(k)`.
    pub std_err: f64,
}

impl MetricSummary {
    /// Summarize per-fold values. Needs at least two values for a finite SE.
    #[must_use]
    pub fn from_values(metric: MetricName, values: &[f64]) -> Self {
        let k = values.len() as f64;
        let mean = values.iter().sum::<f64>() / k;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (k - 1.0);
        Self {
            metric,
            mean,
            std_err: var.sqrt() / k.sqrt(),
        }
    }
}

/// Per-fold metrics and their summary.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    /// Metrics of each held-out fold, in fold order.
    pub folds: Vec<Metrics>,
    /// One entry per [`MetricName::ALL`], same order.
    pub summary: Vec<MetricSummary>,
    pub n_folds: usize,
    pub n_samples: usize,
}

impl CrossValidationResult {
    /// Summary for one metric.
    #[must_use]
    pub fn summary_for(&self, metric: MetricName) -> Option<&MetricSummary> {
        self.summary.iter().find(|s| s.metric == metric)
    }

    /// Per-fold values of one metric.
    #[must_use]
    pub fn fold_values(&self, metric: MetricName) -> Vec<f64> {
        self.folds.iter().map(|m| m.get(metric)).collect()
    }
}

impl CrossValidation {
    /// Create a cross-validation config with `n_folds` folds and seed 1337.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, PipelineError> {
        if n_folds < 2 {
            return Err(PipelineError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            n_folds,
            seed: 1337,
        })
    }

    /// Set the seed for fold assignment. Fold `i` also trains with `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Refit the recipe and forest on k-1 folds, score the held-out fold,
    /// and summarize every metric.
    ///
    /// This is the most expensive step of a generation: `k` forests are
    /// grown one after another and the call runs to completion.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PipelineError::InsufficientData`] | a class has fewer rows than folds |
    /// | Other pipeline errors | from fitting or evaluating a fold |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = frame.n_rows()))]
    pub fn run(
        &self,
        recipe_spec: &RecipeSpec,
        model_spec: &ModelSpec,
        frame: &ModelFrame,
    ) -> Result<CrossValidationResult, PipelineError> {
        let assignments = self.stratified_folds(frame.labels())?;
        let mut folds = Vec::with_capacity(self.n_folds);

        for fold in 0..self.n_folds {
            let (held_out, kept): (Vec<usize>, Vec<usize>) =
                (0..frame.n_rows()).partition(|&i| assignments[i] == fold);
            let fold_train = frame.select(&kept);
            let fold_test = frame.select(&held_out);

            let recipe = recipe_spec.fit(&fold_train)?;
            let spec = model_spec.with_seed(self.seed.wrapping_add(fold as u64));
            let model = train(&recipe, &fold_train, &spec)?;
            let result = evaluate(&model, &recipe, &fold_test, 0)?;

            debug!(fold, accuracy = result.metrics.accuracy, "fold completed");
            folds.push(result.metrics);
        }

        let summary: Vec<MetricSummary> = MetricName::ALL
            .iter()
            .map(|&metric| {
                let values: Vec<f64> = folds.iter().map(|m| m.get(metric)).collect();
                MetricSummary::from_values(metric, &values)
            })
            .collect();

        if let Some(acc) = summary.iter().find(|s| s.metric == MetricName::Accuracy) {
            info!(
                mean_accuracy = acc.mean,
                std_err = acc.std_err,
                "cross-validation complete"
            );
        }

        Ok(CrossValidationResult {
            folds,
            summary,
            n_folds: self.n_folds,
            n_samples: frame.n_rows(),
        })
    }

    /// Shuffle each class with the seed and deal its rows round-robin.
    fn stratified_folds(&self, labels: &[Label]) -> Result<Vec<usize>, PipelineError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut assignments = vec![0usize; labels.len()];

        for label in Label::ALL {
            let mut members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == label)
                .map(|(i, _)| i)
                .collect();
            if members.len() < self.n_folds {
                return Err(PipelineError::InsufficientData {
                    stage: "cross-validation",
                    label,
                    count: members.len(),
                    required: self.n_folds,
                });
            }
            members.shuffle(&mut rng);
            for (j, &row) in members.iter().enumerate() {
                assignments[row] = j % self.n_folds;
            }
        }
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::StepKind;
    use crate::train::TreeCount;
    use cachexia_io::{Metabolite, TimePoint};

    fn frame(n: usize) -> ModelFrame {
        let labels: Vec<Label> = (0..n).map(|i| Label::from_index(usize::from(i % 3 == 0))).collect();
        let signal = labels
            .iter()
            .enumerate()
            .map(|(i, l)| 2.0 + l.index() as f64 * 3.0 + (i % 7) as f64 * 0.3)
            .collect();
        let noise = (0..n).map(|i| ((i * 13) % 17) as f64 + 1.0).collect();
        ModelFrame::new(
            labels,
            (0..n).map(|i| (i % 2 == 0).then_some(TimePoint::Day0)).collect(),
            vec![Metabolite::new("signal", signal), Metabolite::new("noise", noise)],
        )
    }

    #[test]
    fn summary_is_mean_and_standard_error() {
        let values = [0.8, 0.9, 1.0, 0.7, 0.6, 0.9, 0.8, 1.0, 0.75, 0.85];
        let s = MetricSummary::from_values(MetricName::Accuracy, &values);
        let mean = values.iter().sum::<f64>() / 10.0;
        let sd = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 9.0).sqrt();
        assert!((s.mean - mean).abs() < 1e-12);
        assert!((s.std_err - sd / 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn folds_are_stratified_and_balanced() {
        let f = frame(60);
        let cv = CrossValidation::new(10).unwrap();
        let assignments = cv.stratified_folds(f.labels()).unwrap();
        for fold in 0..10 {
            let rows: Vec<usize> = (0..60).filter(|&i| assignments[i] == fold).collect();
            let cachexic = rows
                .iter()
                .filter(|&&i| f.labels()[i] == Label::Cachexic)
                .count();
            assert_eq!(rows.len(), 6);
            assert_eq!(cachexic, 2);
        }
    }

    #[test]
    fn ten_fold_summary_matches_fold_values() {
        let f = frame(60);
        let result = CrossValidation::new(10)
            .unwrap()
            .with_seed(5)
            .run(
                &RecipeSpec::new(vec![StepKind::Center, StepKind::Scale]),
                &ModelSpec::new(TreeCount::new(10).unwrap()),
                &f,
            )
            .unwrap();
        assert_eq!(result.folds.len(), 10);
        assert_eq!(result.summary.len(), MetricName::ALL.len());
        for metric in MetricName::ALL {
            let values = result.fold_values(metric);
            let summary = result.summary_for(metric).unwrap();
            let mean = values.iter().sum::<f64>() / 10.0;
            assert!((summary.mean - mean).abs() < 1e-12, "{metric}");
        }
        let acc = result.summary_for(MetricName::Accuracy).unwrap();
        assert!(acc.mean > 0.7, "mean accuracy = {}", acc.mean);
    }

    #[test]
    fn too_few_rows_per_class() {
        let f = frame(12);
        let err = CrossValidation::new(10)
            .unwrap()
            .run(
                &RecipeSpec::new(vec![]),
                &ModelSpec::new(TreeCount::default()),
                &f,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                label: Label::Control,
                count: 8,
                required: 10,
                ..
            }
        ));
    }

    #[test]
    fn fold_count_validated() {
        assert!(matches!(
            CrossValidation::new(1),
            Err(PipelineError::InvalidFoldCount { n_folds: 1 })
        ));
    }

    #[test]
    fn repeat_runs_are_identical() {
        let f = frame(40);
        let cv = CrossValidation::new(4).unwrap();
        let spec = ModelSpec::new(TreeCount::new(5).unwrap());
        let recipe = RecipeSpec::new(vec![StepKind::Normalize]);
        let a = cv.run(&recipe, &spec, &f).unwrap();
        let b = cv.run(&recipe, &spec, &f).unwrap();
        assert_eq!(a.folds, b.folds);
    }
}
