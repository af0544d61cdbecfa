//! Derivation of the `time_points` factor from sample identifiers.

use crate::domain::{SampleId, TimePoint};

/// Where in the identifier a rule pattern must occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Pattern may occur anywhere.
    Contains,
    /// Identifier must start with the pattern.
    Prefix,
    /// Identifier must end with the pattern.
    Suffix,
}

/// One identifier pattern and the level it assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePointRule {
    /// Text to look for, matched case-insensitively.
    pub pattern: String,
    /// Placement of the pattern.
    pub anchor: Anchor,
    /// Level assigned on match.
    pub level: TimePoint,
}

impl TimePointRule {
    /// Create a rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>, anchor: Anchor, level: TimePoint) -> Self {
        Self {
            pattern: pattern.into().to_ascii_lowercase(),
            anchor,
            level,
        }
    }

    fn matches(&self, id: &str) -> bool {
        let id = id.to_ascii_lowercase();
        match self.anchor {
            Anchor::Contains => id.contains(&self.pattern),
            Anchor::Prefix => id.starts_with(&self.pattern),
            Anchor::Suffix => id.ends_with(&self.pattern),
        }
    }
}

/// Ordered rule list; the first matching rule wins.
///
/// Default precedence: visit-1 marker (`_V1`) → `0_days`, visit-2 marker
/// (`_V2`) → `100_days`, single-visit `PIF_` prefix → `0_days`. Anything
/// else is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePointRules {
    rules: Vec<TimePointRule>,
}

impl TimePointRules {
    /// Build from an explicit ordered rule list.
    #[must_use]
    pub fn new(rules: Vec<TimePointRule>) -> Self {
        Self { rules }
    }

    /// Return the rules in precedence order.
    #[must_use]
    pub fn rules(&self) -> &[TimePointRule] {
        &self.rules
    }

    /// Level of the first rule matching `id`, if any.
    #[must_use]
    pub fn derive(&self, id: &SampleId) -> Option<TimePoint> {
        self.rules
            .iter()
            .find(|r| r.matches(id.as_str()))
            .map(|r| r.level)
    }
}

impl Default for TimePointRules {
    fn default() -> Self {
        Self::new(vec![
            TimePointRule::new("_V1", Anchor::Contains, TimePoint::Day0),
            TimePointRule::new("_V2", Anchor::Contains, TimePoint::Day100),
            TimePointRule::new("PIF_", Anchor::Prefix, TimePoint::Day0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(id: &str) -> Option<TimePoint> {
        TimePointRules::default().derive(&SampleId::new(id))
    }

    #[test]
    fn visit_markers() {
        assert_eq!(derive("NETL_005_V1"), Some(TimePoint::Day0));
        assert_eq!(derive("NETL_005_V2"), Some(TimePoint::Day100));
        assert_eq!(derive("netcr_012_v2"), Some(TimePoint::Day100));
    }

    #[test]
    fn single_visit_prefix() {
        assert_eq!(derive("PIF_178"), Some(TimePoint::Day0));
    }

    #[test]
    fn unmatched_is_missing() {
        assert_eq!(derive("NETL_003"), None);
    }

    #[test]
    fn first_match_wins() {
        // Carries both visit markers; visit-1 outranks visit-2.
        assert_eq!(derive("NETL_V2_V1"), Some(TimePoint::Day0));

        let reversed = TimePointRules::new(vec![
            TimePointRule::new("_V2", Anchor::Contains, TimePoint::Day100),
            TimePointRule::new("_V1", Anchor::Contains, TimePoint::Day0),
        ]);
        assert_eq!(
            reversed.derive(&SampleId::new("NETL_V2_V1")),
            Some(TimePoint::Day100)
        );
    }

    #[test]
    fn suffix_anchor() {
        let rules = TimePointRules::new(vec![TimePointRule::new(
            "-b",
            Anchor::Suffix,
            TimePoint::Day100,
        )]);
        assert_eq!(rules.derive(&SampleId::new("P7-B")), Some(TimePoint::Day100));
        assert_eq!(rules.derive(&SampleId::new("P7-BX")), None);
    }
}
