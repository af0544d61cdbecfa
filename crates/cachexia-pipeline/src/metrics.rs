//! Confusion matrix, scalar metrics and ROC curve for the two-class problem.
//!
//! `cachexic` is the positive class throughout.

use std::fmt;

use cachexia_io::Label;

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// 2x2 confusion matrix indexed `[truth][prediction]` by [`Label::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Count paired truth/prediction labels.
    #[must_use]
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (t, p) in truth.iter().zip(predicted) {
            counts[t.index()][p.index()] += 1;
        }
        Self { counts }
    }

    /// Build directly from the four cells.
    #[must_use]
    pub fn from_counts(tp: usize, fp: usize, fn_: usize, tn: usize) -> Self {
        let (c, x) = (Label::Control.index(), Label::Cachexic.index());
        let mut counts = [[0usize; 2]; 2];
        counts[x][x] = tp;
        counts[c][x] = fp;
        counts[x][c] = fn_;
        counts[c][c] = tn;
        Self { counts }
    }

    /// Cell count for a truth/prediction pair.
    #[must_use]
    pub fn get(&self, truth: Label, predicted: Label) -> usize {
        self.counts[truth.index()][predicted.index()]
    }

    #[must_use]
    pub fn tp(&self) -> usize {
        self.get(Label::Cachexic, Label::Cachexic)
    }

    #[must_use]
    pub fn fp(&self) -> usize {
        self.get(Label::Control, Label::Cachexic)
    }

    #[must_use]
    pub fn fn_(&self) -> usize {
        self.get(Label::Cachexic, Label::Control)
    }

    #[must_use]
    pub fn tn(&self) -> usize {
        self.get(Label::Control, Label::Control)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Rows of the matrix, truth-major.
    #[must_use]
    pub fn as_rows(&self) -> &[[usize; 2]; 2] {
        &self.counts
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>9} {:>9}", "truth", "control", "cachexic")?;
        for truth in Label::ALL {
            writeln!(
                f,
                "{:>10} {:>9} {:>9}",
                truth.as_str(),
                self.get(truth, Label::Control),
                self.get(truth, Label::Cachexic)
            )?;
        }
        Ok(())
    }
}

/// Names of the scalar metrics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    Accuracy,
    Precision,
    Recall,
    Sensitivity,
    Specificity,
    F1,
    RocAuc,
}

impl MetricName {
    /// Every metric in report order.
    pub const ALL: [MetricName; 7] = [
        MetricName::Accuracy,
        MetricName::Precision,
        MetricName::Recall,
        MetricName::Sensitivity,
        MetricName::Specificity,
        MetricName::F1,
        MetricName::RocAuc,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Accuracy => "accuracy",
            MetricName::Precision => "precision",
            MetricName::Recall => "recall",
            MetricName::Sensitivity => "sensitivity",
            MetricName::Specificity => "specificity",
            MetricName::F1 => "f1",
            MetricName::RocAuc => "roc_auc",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar metrics for one evaluation. Every 0/0 is reported as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub accuracy: f64,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Same as recall.
    pub sensitivity: f64,
    /// TN / (TN + FP).
    pub specificity: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Area under the ROC curve.
    pub roc_auc: f64,
}

impl Metrics {
    /// Derive every metric from a confusion matrix and a ROC AUC.
    #[must_use]
    pub fn from_confusion(cm: &ConfusionMatrix, roc_auc: f64) -> Self {
        let precision = ratio(cm.tp(), cm.tp() + cm.fp());
        let recall = ratio(cm.tp(), cm.tp() + cm.fn_());
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            accuracy: ratio(cm.tp() + cm.tn(), cm.total()),
            precision,
            recall,
            sensitivity: recall,
            specificity: ratio(cm.tn(), cm.tn() + cm.fp()),
            f1,
            roc_auc,
        }
    }

    /// Value of one named metric.
    #[must_use]
    pub fn get(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::Accuracy => self.accuracy,
            MetricName::Precision => self.precision,
            MetricName::Recall => self.recall,
            MetricName::Sensitivity => self.sensitivity,
            MetricName::Specificity => self.specificity,
            MetricName::F1 => self.f1,
            MetricName::RocAuc => self.roc_auc,
        }
    }
}

/// One ROC operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    /// Rows scoring at or above this are called cachexic.
    pub threshold: f64,
    /// False positive rate, 1 - specificity.
    pub fpr: f64,
    /// True positive rate, sensitivity.
    pub tpr: f64,
}

/// ROC curve from predicted cachexic probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    points: Vec<RocPoint>,
    n_pos: usize,
    n_neg: usize,
}

impl RocCurve {
    /// Sweep the distinct scores in descending order.
    ///
    /// The first point is (0, 0) at threshold +inf and the last is (1, 1).
    /// When a class is absent its rate stays 0 until a closing point at
    /// threshold -inf.
    #[must_use]
    pub fn new(truth: &[Label], scores: &[f64]) -> Self {
        let n_pos = truth.iter().filter(|&&l| l == Label::Cachexic).count();
        let n_neg = truth.len() - n_pos;

        let mut order: Vec<usize> = (0..scores.len().min(truth.len())).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut points = vec![RocPoint {
            threshold: f64::INFINITY,
            fpr: 0.0,
            tpr: 0.0,
        }];
        let (mut tp, mut fp) = (0usize, 0usize);
        let mut i = 0;
        while i < order.len() {
            let threshold = scores[order[i]];
            // Rows tied on score move together.
            while i < order.len() && scores[order[i]] == threshold {
                if truth[order[i]] == Label::Cachexic {
                    tp += 1;
                } else {
                    fp += 1;
                }
                i += 1;
            }
            points.push(RocPoint {
                threshold,
                fpr: ratio(fp, n_neg),
                tpr: ratio(tp, n_pos),
            });
        }
        if points.last().is_none_or(|p| p.fpr < 1.0 || p.tpr < 1.0) {
            points.push(RocPoint {
                threshold: f64::NEG_INFINITY,
                fpr: 1.0,
                tpr: 1.0,
            });
        }
        Self {
            points,
            n_pos,
            n_neg,
        }
    }

    #[must_use]
    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    /// Trapezoid area under the curve; 0 when either class is absent.
    #[must_use]
    pub fn auc(&self) -> f64 {
        if self.n_pos == 0 || self.n_neg == 0 {
            return 0.0;
        }
        self.points
            .windows(2)
            .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-3;

    #[test]
    fn worked_example_precision_recall_f1() {
        let cm = ConfusionMatrix::from_counts(10, 2, 3, 15);
        let m = Metrics::from_confusion(&cm, 0.0);
        assert!((m.precision - 0.833).abs() < TOL);
        assert!((m.recall - 0.769).abs() < TOL);
        assert!((m.f1 - 0.800).abs() < TOL);
        assert!((m.specificity - 15.0 / 17.0).abs() < 1e-12);
        assert!((m.accuracy - 25.0 / 30.0).abs() < 1e-12);
        assert_eq!(m.sensitivity, m.recall);
        assert_eq!(cm.total(), 30);
    }

    #[test]
    fn zero_over_zero_is_zero() {
        let m = Metrics::from_confusion(&ConfusionMatrix::default(), 0.0);
        for metric in MetricName::ALL {
            assert_eq!(m.get(metric), 0.0, "{metric}");
        }
        // Nothing predicted cachexic.
        let m = Metrics::from_confusion(&ConfusionMatrix::from_counts(0, 0, 4, 6), 0.5);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.roc_auc, 0.5);
    }

    #[test]
    fn matrix_indexed_truth_then_prediction() {
        use Label::*;
        let cm = ConfusionMatrix::from_labels(
            &[Control, Control, Cachexic, Cachexic, Cachexic],
            &[Control, Cachexic, Cachexic, Control, Cachexic],
        );
        assert_eq!(cm.tn(), 1);
        assert_eq!(cm.fp(), 1);
        assert_eq!(cm.fn_(), 1);
        assert_eq!(cm.tp(), 2);
        assert_eq!(cm.as_rows(), &[[1, 1], [1, 2]]);
    }

    #[test]
    fn perfect_ranking_has_unit_auc() {
        use Label::*;
        let roc = RocCurve::new(&[Control, Cachexic, Control, Cachexic], &[0.1, 0.9, 0.3, 0.8]);
        assert!((roc.auc() - 1.0).abs() < 1e-12);
        let first = roc.points()[0];
        let last = *roc.points().last().unwrap();
        assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
    }

    #[test]
    fn inverted_and_tied_rankings() {
        use Label::*;
        let inverted = RocCurve::new(&[Cachexic, Control], &[0.2, 0.7]);
        assert!(inverted.auc().abs() < 1e-12);

        let tied = RocCurve::new(&[Cachexic, Control, Cachexic, Control], &[0.5; 4]);
        assert_eq!(tied.points().len(), 2);
        assert!((tied.auc() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_overlap_auc() {
        use Label::*;
        // One of four positive/negative pairs is misordered.
        let roc = RocCurve::new(&[Cachexic, Control, Cachexic, Control], &[0.9, 0.6, 0.4, 0.1]);
        assert!((roc.auc() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn single_class_auc_is_zero() {
        let roc = RocCurve::new(&[Label::Control; 3], &[0.2, 0.4, 0.9]);
        assert_eq!(roc.auc(), 0.0);
        let last = *roc.points().last().unwrap();
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
    }
}
