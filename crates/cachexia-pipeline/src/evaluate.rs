//! Held-out evaluation of a trained model.

use cachexia_io::Label;
use cachexia_rf::RankedFeature;
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::frame::ModelFrame;
use crate::metrics::{ConfusionMatrix, Metrics, RocCurve};
use crate::recipe::Recipe;
use crate::train::TrainedModel;

/// Prediction for one held-out row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Position within the evaluated frame.
    pub row: usize,
    pub truth: Label,
    pub predicted: Label,
    /// Averaged tree probability of `cachexic`.
    pub probability: f64,
}

/// Everything derived from scoring the held-out partition.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub confusion: ConfusionMatrix,
    pub metrics: Metrics,
    pub predictions: Vec<Prediction>,
    pub roc: RocCurve,
    /// Top features by impurity importance.
    pub vip: Vec<RankedFeature>,
}

/// Score `test` with `model` after transforming it with the training recipe.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::EmptyPartition`] | `test` has no rows |
/// | [`PipelineError::RecipeMismatch`] | `test` columns differ from the recipe's |
/// | [`PipelineError::Training`] | the forest rejects the feature rows |
#[instrument(skip_all, fields(n_test = test.n_rows()))]
pub fn evaluate(
    model: &TrainedModel,
    recipe: &Recipe,
    test: &ModelFrame,
    vip_count: usize,
) -> Result<EvaluationResult, PipelineError> {
    if test.n_rows() == 0 {
        return Err(PipelineError::EmptyPartition { stage: "evaluation" });
    }
    let prepared = recipe.apply(test)?;
    let probabilities = model.predict_proba(&prepared)?;

    let predictions: Vec<Prediction> = probabilities
        .iter()
        .zip(prepared.labels())
        .enumerate()
        .map(|(row, (probs, &truth))| Prediction {
            row,
            truth,
            predicted: Label::from_index(probs.predicted_class()),
            probability: probs.of(Label::Cachexic.index()),
        })
        .collect();

    let predicted: Vec<Label> = predictions.iter().map(|p| p.predicted).collect();
    let scores: Vec<f64> = predictions.iter().map(|p| p.probability).collect();
    let confusion = ConfusionMatrix::from_labels(prepared.labels(), &predicted);
    let roc = RocCurve::new(prepared.labels(), &scores);
    let metrics = Metrics::from_confusion(&confusion, roc.auc());

    info!(
        accuracy = metrics.accuracy,
        f1 = metrics.f1,
        roc_auc = metrics.roc_auc,
        "held-out evaluation complete"
    );

    Ok(EvaluationResult {
        confusion,
        metrics,
        predictions,
        roc,
        vip: model.vip(vip_count).to_vec(),
    })
}
