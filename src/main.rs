use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cachexia_io::SampleReader;
use cachexia_pipeline::{
    CrossValidationResult, EvaluationResult, Inputs, MetricName, Metrics, NormalizationChoice,
    PipelineConfig, Session, TreeCount, mean_sd, normalize,
};

#[derive(Parser)]
#[command(name = "cachexia")]
#[command(about = "Cachexia classification from urinary metabolite concentrations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the split, forest bootstrap and fold assignment
    #[arg(long, default_value_t = 1337, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for forest training (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Where the dataset lives and how to read it.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the metabolite CSV file
    #[arg(long)]
    data: PathBuf,

    /// Columns between the label and the first metabolite to skip
    #[arg(long, default_value_t = 1)]
    auxiliary_columns: usize,
}

/// Model and evaluation settings.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Number of trees: a multiple of 5 from 5 to 100
    #[arg(long, default_value_t = 10)]
    trees: usize,

    /// Number of cross-validation folds on the training partition
    #[arg(long, default_value_t = 10)]
    folds: usize,

    /// Number of top features in the importance ranking
    #[arg(long, default_value_t = 10)]
    vip: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize the dataset and summarize the resulting columns
    Normalize {
        #[command(flatten)]
        data: DataArgs,

        /// Normalization strategy, e.g. "log2_transform & pareto_scale" or "log2-pareto"
        #[arg(long, default_value = "log2_transform & center")]
        normalization: NormalizationChoice,
    },

    /// Run the full pipeline for one normalization and tree count
    Evaluate {
        #[command(flatten)]
        data: DataArgs,

        /// Normalization strategy, e.g. "log2_transform & pareto_scale" or "log2-pareto"
        #[arg(long, default_value = "log2_transform & center")]
        normalization: NormalizationChoice,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Compare all four normalization strategies at one tree count
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        model: ModelArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ClassCounts {
    control: usize,
    cachexic: usize,
}

#[derive(Serialize)]
struct ColumnSummary {
    name: String,
    mean: f64,
    sd: f64,
}

#[derive(Serialize)]
struct NormalizeOutput {
    normalization: String,
    n_rows: usize,
    class_counts: ClassCounts,
    n_retained: usize,
    dropped_columns: Vec<String>,
    columns: Vec<ColumnSummary>,
}

#[derive(Serialize)]
struct MetricValue {
    metric: &'static str,
    value: f64,
}

#[derive(Serialize)]
struct MetricSummaryOutput {
    metric: &'static str,
    mean: f64,
    std_err: f64,
}

#[derive(Serialize)]
struct ConfusionOutput {
    tp: usize,
    fp: usize,
    #[serde(rename = "fn")]
    fn_: usize,
    tn: usize,
}

#[derive(Serialize)]
struct RocPointOutput {
    threshold: f64,
    fpr: f64,
    tpr: f64,
}

#[derive(Serialize)]
struct PredictionOutput {
    truth: &'static str,
    predicted: &'static str,
    probability: f64,
}

#[derive(Serialize)]
struct VipOutput {
    rank: usize,
    name: String,
    importance: f64,
}

#[derive(Serialize)]
struct EvaluateOutput {
    normalization: String,
    n_trees: usize,
    seed: u64,
    n_rows: usize,
    n_train: usize,
    n_test: usize,
    dropped_columns: Vec<String>,
    recipe: Vec<String>,
    model: String,
    confusion_matrix: ConfusionOutput,
    metrics: Vec<MetricValue>,
    roc_curve: Vec<RocPointOutput>,
    predictions: Vec<PredictionOutput>,
    vip: Vec<VipOutput>,
    cross_validation: Vec<MetricSummaryOutput>,
}

#[derive(Serialize)]
struct SweepEntry {
    normalization: String,
    n_dropped: Option<usize>,
    test_metrics: Option<Vec<MetricValue>>,
    cv_accuracy_mean: Option<f64>,
    cv_accuracy_std_err: Option<f64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SweepOutput {
    n_trees: usize,
    seed: u64,
    n_rows: usize,
    results: Vec<SweepEntry>,
}

fn metric_values(metrics: &Metrics) -> Vec<MetricValue> {
    MetricName::ALL
        .iter()
        .map(|&m| MetricValue {
            metric: m.as_str(),
            value: metrics.get(m),
        })
        .collect()
}

fn cv_summaries(cv: &CrossValidationResult) -> Vec<MetricSummaryOutput> {
    cv.summary
        .iter()
        .map(|s| MetricSummaryOutput {
            metric: s.metric.as_str(),
            mean: s.mean,
            std_err: s.std_err,
        })
        .collect()
}

fn evaluation_parts(
    eval: &EvaluationResult,
) -> (ConfusionOutput, Vec<RocPointOutput>, Vec<PredictionOutput>, Vec<VipOutput>) {
    let confusion = ConfusionOutput {
        tp: eval.confusion.tp(),
        fp: eval.confusion.fp(),
        fn_: eval.confusion.fn_(),
        tn: eval.confusion.tn(),
    };
    let roc = eval
        .roc
        .points()
        .iter()
        // JSON has no infinities; the end points carry no threshold information.
        .filter(|p| p.threshold.is_finite())
        .map(|p| RocPointOutput {
            threshold: p.threshold,
            fpr: p.fpr,
            tpr: p.tpr,
        })
        .collect();
    let predictions = eval
        .predictions
        .iter()
        .map(|p| PredictionOutput {
            truth: p.truth.as_str(),
            predicted: p.predicted.as_str(),
            probability: p.probability,
        })
        .collect();
    let vip = eval
        .vip
        .iter()
        .map(|f| VipOutput {
            rank: f.rank,
            name: f.name.clone(),
            importance: f.importance,
        })
        .collect();
    (confusion, roc, predictions, vip)
}

fn open_session(data: &DataArgs, config: PipelineConfig) -> Result<Session> {
    let table = SampleReader::new(&data.data)
        .with_auxiliary_columns(data.auxiliary_columns)
        .read()
        .context("failed to read input CSV")?;
    Session::new(table, config).context("invalid pipeline configuration")
}

fn pipeline_config(seed: u64, model: &ModelArgs) -> PipelineConfig {
    PipelineConfig::new(seed)
        .with_folds(model.folds)
        .with_vip_count(model.vip)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Normalize {
            data,
            normalization,
        } => {
            let table = SampleReader::new(&data.data)
                .with_auxiliary_columns(data.auxiliary_columns)
                .read()
                .context("failed to read input CSV")?;
            let normalized = normalize(&table, normalization).context("normalization failed")?;
            let [control, cachexic] = table.class_counts();

            let output = NormalizeOutput {
                normalization: normalization.to_string(),
                n_rows: normalized.n_rows(),
                class_counts: ClassCounts { control, cachexic },
                n_retained: normalized.columns().len(),
                dropped_columns: normalized.dropped_columns().to_vec(),
                columns: normalized
                    .columns()
                    .iter()
                    .map(|c| {
                        let (mean, sd) = mean_sd(&c.values);
                        ColumnSummary {
                            name: c.name.clone(),
                            mean,
                            sd,
                        }
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            data,
            normalization,
            model,
        } => {
            let trees = TreeCount::new(model.trees)?;
            let mut session = open_session(&data, pipeline_config(cli.seed, &model))?;
            let report = session.report(Inputs::new(normalization, trees));

            let normalized = report.normalized.context("normalization failed")?;
            let partition = report.partition.context("train/test split failed")?;
            let recipe = report.recipe.context("recipe fitting failed")?;
            let trained = report.model.context("model training failed")?;
            let eval = report.evaluation.context("evaluation failed")?;
            let cv = report
                .cross_validation
                .context("cross-validation failed")?;

            let (confusion_matrix, roc_curve, predictions, vip) = evaluation_parts(&eval);
            let output = EvaluateOutput {
                normalization: normalization.to_string(),
                n_trees: trees.get(),
                seed: cli.seed,
                n_rows: normalized.n_rows(),
                n_train: partition.split.train().len(),
                n_test: partition.split.test().len(),
                dropped_columns: normalized.dropped_columns().to_vec(),
                recipe: recipe.describe(),
                model: trained.describe(),
                confusion_matrix,
                metrics: metric_values(&eval.metrics),
                roc_curve,
                predictions,
                vip,
                cross_validation: cv_summaries(&cv),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Sweep { data, model } => {
            let trees = TreeCount::new(model.trees)?;
            let mut session = open_session(&data, pipeline_config(cli.seed, &model))?;

            let mut results = Vec::with_capacity(NormalizationChoice::ALL.len());
            for choice in NormalizationChoice::ALL {
                let report = session.report(Inputs::new(choice, trees));
                let n_dropped = report
                    .normalized
                    .as_ref()
                    .ok()
                    .map(|n| n.dropped_columns().len());
                let entry = match (report.evaluation, report.cross_validation) {
                    (Ok(eval), Ok(cv)) => {
                        let acc = cv.summary_for(MetricName::Accuracy);
                        SweepEntry {
                            normalization: choice.to_string(),
                            n_dropped,
                            test_metrics: Some(metric_values(&eval.metrics)),
                            cv_accuracy_mean: acc.map(|s| s.mean),
                            cv_accuracy_std_err: acc.map(|s| s.std_err),
                            error: None,
                        }
                    }
                    (Err(e), _) | (_, Err(e)) => SweepEntry {
                        normalization: choice.to_string(),
                        n_dropped,
                        test_metrics: None,
                        cv_accuracy_mean: None,
                        cv_accuracy_std_err: None,
                        error: Some(format!("{:#}", anyhow::Error::from(e))),
                    },
                };
                results.push(entry);
            }

            let output = SweepOutput {
                n_trees: trees.get(),
                seed: cli.seed,
                n_rows: session.table().n_rows(),
                results,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
