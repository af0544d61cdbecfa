//! Whole-table transforms applied before the train/test split.

use cachexia_io::{Label, Metabolite, SampleId, TimePoint, WorkingTable};
use tracing::{debug, info, instrument, warn};

use crate::choice::NormalizationChoice;
use crate::error::PipelineError;
use crate::frame::ModelFrame;

/// Mean and sample standard deviation (n - 1). SD is `NaN` for fewer than two values.
#[must_use]
pub fn mean_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Base-2 logarithm of every value. Zero maps to `-inf`.
#[must_use]
pub fn log2_transform(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.log2()).collect()
}

/// Mean-center, then divide by the square root of the sample SD.
///
/// A constant column yields `NaN` everywhere.
#[must_use]
pub fn pareto_scale(values: &[f64]) -> Vec<f64> {
    let (mean, sd) = mean_sd(values);
    let divisor = sd.sqrt();
    values.iter().map(|v| (v - mean) / divisor).collect()
}

/// The working table after one normalization strategy.
///
/// Row order and the categorical columns are those of the source table.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    choice: NormalizationChoice,
    sample_ids: Vec<SampleId>,
    labels: Vec<Label>,
    time_points: Vec<Option<TimePoint>>,
    columns: Vec<Metabolite>,
    dropped_columns: Vec<String>,
}

impl NormalizedTable {
    /// Strategy that produced this table.
    #[must_use]
    pub fn choice(&self) -> NormalizationChoice {
        self.choice
    }

    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn time_points(&self) -> &[Option<TimePoint>] {
        &self.time_points
    }

    /// Retained metabolite columns.
    #[must_use]
    pub fn columns(&self) -> &[Metabolite] {
        &self.columns
    }

    /// Metabolites removed because the transform made them non-finite.
    #[must_use]
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Modeling view: identifiers removed, everything else kept.
    #[must_use]
    pub fn frame(&self) -> ModelFrame {
        ModelFrame::new(
            self.labels.clone(),
            self.time_points.clone(),
            self.columns.clone(),
        )
    }
}

/// Apply `choice` to every metabolite column of `table`.
///
/// Columns holding any non-finite value afterwards (log of zero, pareto of a
/// constant column) are dropped with a warning rather than failing.
///
/// # Errors
///
/// Returns [`PipelineError::DataShape`] when every metabolite is dropped.
#[instrument(skip_all, fields(choice = %choice, n_rows = table.n_rows()))]
pub fn normalize(
    table: &WorkingTable,
    choice: NormalizationChoice,
) -> Result<NormalizedTable, PipelineError> {
    let strategy = choice.strategy();
    let mut columns = Vec::with_capacity(table.n_metabolites());
    let mut dropped_columns = Vec::new();

    for metabolite in table.metabolites() {
        let mut values = if strategy.log2 {
            log2_transform(&metabolite.values)
        } else {
            metabolite.values.clone()
        };
        if strategy.pareto {
            values = pareto_scale(&values);
        }
        if values.iter().all(|v| v.is_finite()) {
            columns.push(Metabolite::new(metabolite.name.clone(), values));
        } else {
            warn!(column = %metabolite.name, "degenerate column dropped after normalization");
            dropped_columns.push(metabolite.name.clone());
        }
    }

    if columns.is_empty() {
        return Err(PipelineError::DataShape {
            reason: format!("every metabolite column is degenerate under \"{choice}\""),
        });
    }
    debug!(dropped = ?dropped_columns, "normalization applied");
    info!(
        retained = columns.len(),
        dropped = dropped_columns.len(),
        "table normalized"
    );

    Ok(NormalizedTable {
        choice,
        sample_ids: table.sample_ids().to_vec(),
        labels: table.labels().to_vec(),
        time_points: table.time_points().to_vec(),
        columns,
        dropped_columns,
    })
}
