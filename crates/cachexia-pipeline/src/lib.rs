//! Normalization, train/test splitting, recipes, random forest training,
//! evaluation and cross-validation for the cachexia metabolite dataset.
//!
//! Every stage is a pure function of its inputs and an explicit seed.
//! [`Session`] wires the stages into a memoized graph driven by the two
//! user-facing controls, the [`NormalizationChoice`] and the [`TreeCount`].

mod choice;
mod config;
mod cv;
mod error;
mod evaluate;
mod frame;
mod metrics;
mod normalize;
mod partition;
mod recipe;
mod session;
mod train;

pub use choice::{NormalizationChoice, Strategy};
pub use config::PipelineConfig;
pub use cv::{CrossValidation, CrossValidationResult, MetricSummary};
pub use error::PipelineError;
pub use evaluate::{EvaluationResult, Prediction, evaluate};
pub use frame::{ModelFrame, TIME_POINTS_FEATURE, time_point_code};
pub use metrics::{ConfusionMatrix, MetricName, Metrics, RocCurve, RocPoint};
pub use normalize::{NormalizedTable, log2_transform, mean_sd, normalize, pareto_scale};
pub use partition::{Split, split};
pub use recipe::{ColumnStats, FittedStep, Recipe, RecipeSpec, StepKind};
pub use session::{Inputs, Partition, Report, Session};
pub use train::{ModelSpec, TrainedModel, TreeCount, train};
