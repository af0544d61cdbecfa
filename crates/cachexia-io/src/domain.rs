//! Domain types for the metabolite dataset.

use std::fmt;

use crate::IoError;

/// A patient/sample identifier from the first CSV column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    /// Wrap a non-empty identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        debug_assert!(!id.is_empty(), "sample id must not be empty");
        Self(id)
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diagnosis label. `Cachexic` is the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// No muscle wasting.
    Control,
    /// Muscle wasting present.
    Cachexic,
}

impl Label {
    /// Both labels, in class-index order.
    pub const ALL: [Label; 2] = [Label::Control, Label::Cachexic];

    /// Parse a label case-insensitively, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("control") {
            Some(Label::Control)
        } else if raw.eq_ignore_ascii_case("cachexic") {
            Some(Label::Cachexic)
        } else {
            None
        }
    }

    /// Zero-based class index used by the classifier.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Label::Control => 0,
            Label::Cachexic => 1,
        }
    }

    /// Inverse of [`Label::index`]; any index other than 1 maps to `Control`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        if index == 1 { Label::Cachexic } else { Label::Control }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Control => "control",
            Label::Cachexic => "cachexic",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling visit derived from the sample identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimePoint {
    /// First visit.
    Day0,
    /// Follow-up visit.
    Day100,
}

impl TimePoint {
    /// Factor level name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimePoint::Day0 => "0_days",
            TimePoint::Day100 => "100_days",
        }
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metabolite concentration column.
#[derive(Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Canonical column name.
    pub name: String,
    /// Concentration per sample, in table row order.
    pub values: Vec<f64>,
}

impl Metabolite {
    /// Create a named column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// The canonical working table: one row per sample.
///
/// Identifier, label and time point are categorical and never enter the
/// numeric feature set. The table is immutable once built.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    sample_ids: Vec<SampleId>,
    labels: Vec<Label>,
    time_points: Vec<Option<TimePoint>>,
    metabolites: Vec<Metabolite>,
}

impl WorkingTable {
    /// Assemble a table from parallel columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::EmptyDataset`] | zero rows |
    /// | [`IoError::NoMetabolites`] | zero metabolite columns |
    /// | [`IoError::RaggedTable`] | a column length differs from the id count |
    /// | [`IoError::TooFewClasses`] | only one label present |
    pub fn new(
        sample_ids: Vec<SampleId>,
        labels: Vec<Label>,
        time_points: Vec<Option<TimePoint>>,
        metabolites: Vec<Metabolite>,
    ) -> Result<Self, IoError> {
        let n = sample_ids.len();
        if n == 0 {
            return Err(IoError::EmptyDataset);
        }
        if metabolites.is_empty() {
            return Err(IoError::NoMetabolites);
        }
        let ragged = |column: &str, got: usize| IoError::RaggedTable {
            column: column.to_string(),
            expected: n,
            got,
        };
        if labels.len() != n {
            return Err(ragged("label", labels.len()));
        }
        if time_points.len() != n {
            return Err(ragged("time_points", time_points.len()));
        }
        if let Some(m) = metabolites.iter().find(|m| m.values.len() != n) {
            return Err(ragged(&m.name, m.values.len()));
        }
        let n_classes = Label::ALL
            .iter()
            .filter(|l| labels.contains(l))
            .count();
        if n_classes < 2 {
            return Err(IoError::TooFewClasses { n_classes });
        }
        Ok(Self {
            sample_ids,
            labels,
            time_points,
            metabolites,
        })
    }

    /// Return the sample identifiers.
    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    /// Return the labels.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Return the derived time points (`None` = missing).
    #[must_use]
    pub fn time_points(&self) -> &[Option<TimePoint>] {
        &self.time_points
    }

    /// Return the metabolite columns.
    #[must_use]
    pub fn metabolites(&self) -> &[Metabolite] {
        &self.metabolites
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.sample_ids.len()
    }

    /// Return the number of metabolite columns.
    #[must_use]
    pub fn n_metabolites(&self) -> usize {
        self.metabolites.len()
    }

    /// Count of rows per label, indexed by [`Label::index`].
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}
