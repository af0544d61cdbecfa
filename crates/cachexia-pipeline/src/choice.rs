//! The four normalization strategies and their table-driven definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;
use crate::recipe::StepKind;

/// User-selectable normalization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalizationChoice {
    /// Raw values; the recipe normalizes, centers and scales.
    NormalizeCenter,
    /// log2 then pareto scaling up front; no recipe steps.
    Log2Pareto,
    /// Pareto scaling up front; the recipe normalizes.
    NormalizePareto,
    /// log2 up front; the recipe centers and scales.
    #[default]
    Log2Center,
}

/// What a [`NormalizationChoice`] does before and after the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Canonical selector label.
    pub label: &'static str,
    /// Short alias accepted by [`NormalizationChoice::from_str`].
    pub alias: &'static str,
    /// Apply `log2` to every metabolite column.
    pub log2: bool,
    /// Pareto-scale every metabolite column after the optional `log2`.
    pub pareto: bool,
    /// Recipe steps fit on the training partition.
    pub recipe: &'static [StepKind],
}

const STRATEGIES: [(NormalizationChoice, Strategy); 4] = [
    (
        NormalizationChoice::NormalizeCenter,
        Strategy {
            label: "normalize & center",
            alias: "normalize-center",
            log2: false,
            pareto: false,
            recipe: &[StepKind::Normalize, StepKind::Center, StepKind::Scale],
        },
    ),
    (
        NormalizationChoice::Log2Pareto,
        Strategy {
            label: "log2_transform & pareto_scale",
            alias: "log2-pareto",
            log2: true,
            pareto: true,
            recipe: &[],
        },
    ),
    (
        NormalizationChoice::NormalizePareto,
        Strategy {
            label: "normalize & pareto_scale",
            alias: "normalize-pareto",
            log2: false,
            pareto: true,
            recipe: &[StepKind::Normalize],
        },
    ),
    (
        NormalizationChoice::Log2Center,
        Strategy {
            label: "log2_transform & center",
            alias: "log2-center",
            log2: true,
            pareto: false,
            recipe: &[StepKind::Center, StepKind::Scale],
        },
    ),
];

impl NormalizationChoice {
    /// Every choice, in selector order.
    pub const ALL: [NormalizationChoice; 4] = [
        NormalizationChoice::NormalizeCenter,
        NormalizationChoice::Log2Pareto,
        NormalizationChoice::NormalizePareto,
        NormalizationChoice::Log2Center,
    ];

    /// Look up this choice's row in the strategy table.
    #[must_use]
    pub fn strategy(self) -> &'static Strategy {
        // Rows are declared in `ALL` order.
        &STRATEGIES[self as usize].1
    }

    /// Canonical selector label, e.g. `"log2_transform & pareto_scale"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.strategy().label
    }
}

impl fmt::Display for NormalizationChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NormalizationChoice {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        STRATEGIES
            .iter()
            .find(|(_, st)| {
                st.label.eq_ignore_ascii_case(wanted) || st.alias.eq_ignore_ascii_case(wanted)
            })
            .map(|(choice, _)| *choice)
            .ok_or_else(|| PipelineError::UnknownNormalization {
                raw: s.to_string(),
                expected: STRATEGIES
                    .iter()
                    .map(|(_, st)| st.label)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_variants() {
        for (i, (choice, _)) in STRATEGIES.iter().enumerate() {
            assert_eq!(NormalizationChoice::ALL[i], *choice);
            assert_eq!(*choice as usize, i);
        }
    }

    #[test]
    fn parses_labels_and_aliases() {
        for choice in NormalizationChoice::ALL {
            assert_eq!(choice.label().parse::<NormalizationChoice>().unwrap(), choice);
            assert_eq!(
                choice.strategy().alias.parse::<NormalizationChoice>().unwrap(),
                choice
            );
        }
        assert_eq!(
            " LOG2_TRANSFORM & PARETO_SCALE ".parse::<NormalizationChoice>().unwrap(),
            NormalizationChoice::Log2Pareto
        );
    }

    #[test]
    fn unknown_label_fails_loudly() {
        let err = "zscore".parse::<NormalizationChoice>().unwrap_err();
        match err {
            PipelineError::UnknownNormalization { raw, expected } => {
                assert_eq!(raw, "zscore");
                assert!(expected.contains("log2_transform & center"));
            }
            other => panic!("expected UnknownNormalization, got {other:?}"),
        }
    }

    #[test]
    fn default_is_log2_center() {
        assert_eq!(NormalizationChoice::default(), NormalizationChoice::Log2Center);
        assert_eq!(NormalizationChoice::default().to_string(), "log2_transform & center");
    }

    #[test]
    fn recipe_steps_avoid_double_transformation() {
        for choice in NormalizationChoice::ALL {
            let st = choice.strategy();
            // Pareto already centers, so no strategy both pareto-scales and recenters.
            if st.pareto {
                assert!(!st.recipe.contains(&StepKind::Center));
            }
        }
        assert!(NormalizationChoice::Log2Pareto.strategy().recipe.is_empty());
    }
}
