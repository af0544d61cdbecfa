//! Modeling frame: labels, the `time_points` factor and metabolite columns.

use cachexia_io::{Label, Metabolite, TimePoint};

/// Name of the encoded `time_points` feature.
pub const TIME_POINTS_FEATURE: &str = "time_points";

/// Ordinal code used for the `time_points` factor: `0_days` = 0,
/// `100_days` = 1, missing = -1.
#[must_use]
pub fn time_point_code(time_point: Option<TimePoint>) -> f64 {
    match time_point {
        Some(TimePoint::Day0) => 0.0,
        Some(TimePoint::Day100) => 1.0,
        None => -1.0,
    }
}

/// Column-major modeling data without sample identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFrame {
    labels: Vec<Label>,
    time_points: Vec<Option<TimePoint>>,
    columns: Vec<Metabolite>,
}

impl ModelFrame {
    /// Assemble a frame from parallel columns of equal length.
    #[must_use]
    pub fn new(
        labels: Vec<Label>,
        time_points: Vec<Option<TimePoint>>,
        columns: Vec<Metabolite>,
    ) -> Self {
        debug_assert_eq!(labels.len(), time_points.len());
        debug_assert!(columns.iter().all(|c| c.values.len() == labels.len()));
        Self {
            labels,
            time_points,
            columns,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn time_points(&self) -> &[Option<TimePoint>] {
        &self.time_points
    }

    #[must_use]
    pub fn columns(&self) -> &[Metabolite] {
        &self.columns
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Metabolite column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Feature names seen by the forest: `time_points` then every metabolite.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        std::iter::once(TIME_POINTS_FEATURE.to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Rows of this frame at `indices`, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            time_points: indices.iter().map(|&i| self.time_points[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Metabolite::new(c.name.clone(), indices.iter().map(|&i| c.values[i]).collect())
                })
                .collect(),
        }
    }

    /// Same rows with the metabolite columns replaced.
    #[must_use]
    pub(crate) fn with_columns(&self, columns: Vec<Metabolite>) -> Self {
        Self::new(self.labels.clone(), self.time_points.clone(), columns)
    }

    /// Row-major feature matrix in [`ModelFrame::feature_names`] order.
    #[must_use]
    pub fn feature_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_rows())
            .map(|row| {
                std::iter::once(time_point_code(self.time_points[row]))
                    .chain(self.columns.iter().map(|c| c.values[row]))
                    .collect()
            })
            .collect()
    }

    /// Class indices for the forest.
    #[must_use]
    pub fn label_indices(&self) -> Vec<usize> {
        self.labels.iter().map(|l| l.index()).collect()
    }

    /// Rows per label, indexed by [`Label::index`].
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}
