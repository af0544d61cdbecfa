//! Preprocessing recipes fit on the training partition only.
//!
//! A [`RecipeSpec`] lists the steps a normalization choice still needs after
//! the whole-table transform. [`RecipeSpec::fit`] learns per-column statistics
//! from a training frame; [`Recipe::apply`] replays exactly those statistics on
//! any other frame, so held-out rows never influence the fit.

use std::fmt;

use cachexia_io::Metabolite;
use tracing::{debug, instrument, warn};

use crate::choice::NormalizationChoice;
use crate::error::PipelineError;
use crate::frame::ModelFrame;
use crate::normalize::mean_sd;

/// One preprocessing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Subtract the mean and divide by the sample SD.
    Normalize,
    /// Subtract the mean.
    Center,
    /// Divide by the sample SD.
    Scale,
}

impl StepKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Normalize => "normalize",
            StepKind::Center => "center",
            StepKind::Scale => "scale",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unfitted, ordered step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSpec {
    steps: Vec<StepKind>,
}

/// Statistics learned for one column by one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    /// Column name.
    pub name: String,
    /// Value subtracted.
    pub shift: f64,
    /// Value divided by, never zero.
    pub divisor: f64,
}

/// A step with its fitted per-column statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedStep {
    /// Which step.
    pub kind: StepKind,
    /// One entry per metabolite column, in frame order.
    pub stats: Vec<ColumnStats>,
}

/// A fitted recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    columns: Vec<String>,
    n_train: usize,
    steps: Vec<FittedStep>,
}

impl RecipeSpec {
    /// Build from an explicit step list.
    #[must_use]
    pub fn new(steps: Vec<StepKind>) -> Self {
        Self { steps }
    }

    /// The steps `choice` defers to after the split.
    #[must_use]
    pub fn for_choice(choice: NormalizationChoice) -> Self {
        Self::new(choice.strategy().recipe.to_vec())
    }

    #[must_use]
    pub fn steps(&self) -> &[StepKind] {
        &self.steps
    }

    /// Fit every step on `train`, each on the output of the previous one.
    ///
    /// Only metabolite columns are touched; `time_points` is a factor and
    /// passes through. A column with zero SD is scaled by 1 and logged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyPartition`] when `train` has no rows.
    #[instrument(skip_all, fields(steps = self.steps.len(), n_train = train.n_rows()))]
    pub fn fit(&self, train: &ModelFrame) -> Result<Recipe, PipelineError> {
        if train.n_rows() == 0 {
            return Err(PipelineError::EmptyPartition { stage: "recipe" });
        }
        let mut current = train.columns().to_vec();
        let mut steps = Vec::with_capacity(self.steps.len());

        for &kind in &self.steps {
            let stats: Vec<ColumnStats> = current
                .iter()
                .map(|column| fit_column(kind, column))
                .collect();
            current = transform(&current, &stats);
            debug!(step = %kind, "recipe step fitted");
            steps.push(FittedStep { kind, stats });
        }

        Ok(Recipe {
            columns: train.column_names(),
            n_train: train.n_rows(),
            steps,
        })
    }
}

fn fit_column(kind: StepKind, column: &Metabolite) -> ColumnStats {
    let (mean, sd) = mean_sd(&column.values);
    let needs_sd = matches!(kind, StepKind::Normalize | StepKind::Scale);
    let divisor = if !needs_sd {
        1.0
    } else if sd.is_finite() && sd > 0.0 {
        sd
    } else {
        warn!(column = %column.name, step = %kind, "zero variance in training rows; scaling by 1");
        1.0
    };
    let shift = match kind {
        StepKind::Normalize | StepKind::Center => mean,
        StepKind::Scale => 0.0,
    };
    ColumnStats {
        name: column.name.clone(),
        shift,
        divisor,
    }
}

fn transform(columns: &[Metabolite], stats: &[ColumnStats]) -> Vec<Metabolite> {
    columns
        .iter()
        .zip(stats)
        .map(|(column, s)| {
            Metabolite::new(
                column.name.clone(),
                column.values.iter().map(|v| (v - s.shift) / s.divisor).collect(),
            )
        })
        .collect()
}

impl Recipe {
    /// Transform `frame` with the statistics learned at fit time.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RecipeMismatch`] when the metabolite columns
    /// differ from those the recipe was fit on.
    pub fn apply(&self, frame: &ModelFrame) -> Result<ModelFrame, PipelineError> {
        let got = frame.column_names();
        if got != self.columns {
            return Err(PipelineError::RecipeMismatch {
                expected: self.columns.clone(),
                got,
            });
        }
        let mut columns = frame.columns().to_vec();
        for step in &self.steps {
            columns = transform(&columns, &step.stats);
        }
        Ok(frame.with_columns(columns))
    }

    /// Metabolite columns the recipe was fit on.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fitted steps in application order.
    #[must_use]
    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    /// Rows the statistics were learned from.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.n_train
    }

    /// One line per step, e.g. `"center: 12 metabolite column(s), fit on 62 rows"`.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        if self.steps.is_empty() {
            return vec![format!(
                "no steps: {} column(s) pass through unchanged",
                self.columns.len()
            )];
        }
        self.steps
            .iter()
            .map(|s| {
                format!(
                    "{}: {} metabolite column(s), fit on {} rows",
                    s.kind,
                    s.stats.len(),
                    self.n_train
                )
            })
            .collect()
    }
}
