//! Mean-decrease-in-impurity aggregation across trees.

/// A feature with its normalized importance and 1-based rank.
#[derive(Debug, Clone)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Share of the total impurity decrease (sums to 1.0 over all features,
    /// or 0.0 everywhere when no tree split at all).
    pub importance: f64,
    /// 1 = most important.
    pub rank: usize,
}

/// Sum per-tree impurity decreases, normalize to 1.0, and rank descending.
///
/// Ties keep the original column order.
pub(crate) fn rank_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, &v) in totals.iter_mut().zip(tree) {
            *total += v;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    #[test]
    fn sums_and_ranks() {
        let per_tree = vec![vec![1.0, 3.0, 0.0], vec![1.0, 1.0, 2.0]];
        let ranked = rank_importances(&per_tree, &names(3));
        assert_eq!(ranked[0].name, "m1");
        assert!((ranked[0].importance - 0.5).abs() < 1e-12);
        assert_eq!(ranked.iter().map(|f| f.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn no_splits_gives_zeros() {
        let ranked = rank_importances(&[vec![0.0, 0.0]], &names(2));
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        assert_eq!(ranked[0].name, "m0");
    }
}
