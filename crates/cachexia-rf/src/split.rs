//! Exact CART split search under the Gini criterion.

use rand::Rng;

use crate::node::FeatureIndex;

/// Gini impurity `1 - Σ p_i²` of a class-count vector. Zero for an empty node.
#[must_use]
pub fn gini(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    1.0 - class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// The best threshold found for a node.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·G(parent) - n_l·G(left) - n_r·G(right)`.
    pub(crate) gain: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Everything a split search needs to know about the node being split.
pub(crate) struct NodeSamples<'a> {
    /// Column-major features: `columns[feature][sample]`.
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) indices: &'a [usize],
    pub(crate) n_classes: usize,
}

impl NodeSamples<'_> {
    pub(crate) fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in self.indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }
}

/// Draw `take` distinct feature indices out of `n_features` (partial Fisher-Yates).
pub(crate) fn sample_features(n_features: usize, take: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = take.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}

/// Midpoint of two ordered values, kept strictly below `next`.
///
/// For adjacent floats the midpoint rounds to `next`; `value` is used instead.
fn threshold_between(value: f64, next: f64) -> f64 {
    let mid = value + (next - value) / 2.0;
    if mid < next { mid } else { value }
}

/// Scan every candidate feature and return the split with the largest Gini gain.
///
/// Returns `None` when no boundary separates distinct values while leaving at
/// least `min_samples_leaf` samples on each side, or when no candidate
/// improves on the parent impurity.
pub(crate) fn best_split(
    node: &NodeSamples<'_>,
    candidates: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = node.indices.len();
    if n < 2 {
        return None;
    }
    let parent_counts = node.class_counts();
    let parent_weighted = n as f64 * gini(&parent_counts, n);

    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in candidates {
        let column = &node.columns[feature];
        let mut ordered: Vec<(f64, usize)> = node
            .indices
            .iter()
            .map(|&i| (column[i], node.labels[i]))
            .collect();
        ordered.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; node.n_classes];
        let mut right_counts = parent_counts.clone();

        for pos in 0..n - 1 {
            let (value, class) = ordered[pos];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next = ordered[pos + 1].0;
            if value == next {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let gain = parent_weighted
                - n_left as f64 * gini(&left_counts, n_left)
                - n_right as f64 * gini(&right_counts, n_right);

            if best.is_none_or(|(_, _, g)| gain > g) {
                best = Some((feature, threshold_between(value, next), gain));
            }
        }
    }

    let (feature, threshold, gain) = best?;
    if gain <= 0.0 {
        return None;
    }

    let column = &node.columns[feature];
    let (left, right): (Vec<usize>, Vec<usize>) =
        node.indices.iter().partition(|&&i| column[i] <= threshold);
    if left.is_empty() || right.is_empty() {
        return None;
    }

    Some(Split {
        feature: FeatureIndex::new(feature),
        threshold,
        gain,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn node<'a>(columns: &'a [Vec<f64>], labels: &'a [usize], indices: &'a [usize]) -> NodeSamples<'a> {
        NodeSamples {
            columns,
            labels,
            indices,
            n_classes: 2,
        }
    }

    #[test]
    fn gini_pure_and_balanced() {
        assert!(gini(&[8, 0], 8).abs() < f64::EPSILON);
        assert!((gini(&[5, 5], 10) - 0.5).abs() < f64::EPSILON);
        assert!(gini(&[0, 0], 0).abs() < f64::EPSILON);
    }

    #[test]
    fn separable_column_splits_between_groups() {
        let columns = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();

        let split = best_split(&node(&columns, &labels, &indices), &[0], 1).unwrap();
        assert_eq!(split.feature.index(), 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.left, vec![0, 1, 2]);
        assert_eq!(split.right, vec![3, 4, 5]);
        // Parent weighted Gini is 6 * 0.5 and both children are pure.
        assert!((split.gain - 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_has_no_split() {
        let columns = vec![vec![4.0; 4]];
        let labels = vec![0, 1, 0, 1];
        let indices: Vec<usize> = (0..4).collect();
        assert!(best_split(&node(&columns, &labels, &indices), &[0], 1).is_none());
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let columns = vec![vec![1.0, 9.0]];
        let labels = vec![0, 1];
        let indices = vec![0, 1];
        assert!(best_split(&node(&columns, &labels, &indices), &[0], 2).is_none());
    }

    #[test]
    fn picks_informative_feature_over_noise() {
        let columns = vec![
            vec![0.3, 0.1, 0.2, 0.3, 0.1, 0.2],
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();
        let split = best_split(&node(&columns, &labels, &indices), &[0, 1], 1).unwrap();
        assert_eq!(split.feature.index(), 1);
    }

    #[test]
    fn adjacent_floats_split_cleanly() {
        let a = f64::from_bits(1.0f64.to_bits() + 1);
        let b = f64::from_bits(a.to_bits() + 1);
        assert!(threshold_between(a, b) < b);

        let columns = vec![vec![a, a, b, b]];
        let labels = vec![0, 0, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let split = best_split(&node(&columns, &labels, &indices), &[0], 1).unwrap();
        assert_eq!(split.left, vec![0, 1]);
        assert_eq!(split.right, vec![2, 3]);
    }

    #[test]
    fn sampled_features_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut picked = sample_features(10, 4, &mut rng);
        assert_eq!(picked.len(), 4);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|&f| f < 10));
    }
}
