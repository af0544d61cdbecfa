//! Single CART classification tree stored as a node arena.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::node::{Node, NodeIndex};
use crate::split::{NodeSamples, best_split, gini, sample_features};

/// Growth limits for one tree. Validated by [`ForestConfig`](crate::ForestConfig).
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
    pub(crate) seed: u64,
}

/// A fitted CART decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct Grower<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl Grower<'_> {
    fn leaf(&mut self, counts: &[usize], n_samples: usize) -> NodeIndex {
        let total = n_samples.max(1) as f64;
        let class_probs = counts.iter().map(|&c| c as f64 / total).collect();
        self.arena.push(Node::Leaf {
            class_probs,
            n_samples,
        });
        NodeIndex::new(self.arena.len() - 1)
    }

    fn grow(&mut self, indices: &[usize], depth: usize) -> NodeIndex {
        let node = NodeSamples {
            columns: self.columns,
            labels: self.labels,
            indices,
            n_classes: self.n_classes,
        };
        let counts = node.class_counts();
        let n_samples = indices.len();

        let at_depth_limit = self.params.max_depth.is_some_and(|d| depth >= d);
        let too_small = n_samples < 2 * self.params.min_samples_leaf;
        if at_depth_limit || too_small || gini(&counts, n_samples) == 0.0 {
            return self.leaf(&counts, n_samples);
        }

        let candidates = sample_features(self.columns.len(), self.params.max_features, &mut self.rng);
        let Some(split) = best_split(&node, &candidates, self.params.min_samples_leaf) else {
            return self.leaf(&counts, n_samples);
        };

        // Reserve the slot so the root stays at index 0; children are appended after it.
        let slot = self.arena.len();
        self.arena.push(Node::Leaf {
            class_probs: Vec::new(),
            n_samples,
        });
        let left = self.grow(&split.left, depth + 1);
        let right = self.grow(&split.right, depth + 1);
        self.arena[slot] = Node::Branch {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            gain: split.gain,
        };
        NodeIndex::new(slot)
    }
}

impl DecisionTree {
    /// Grow a tree on the samples listed in `indices`.
    ///
    /// Inputs are validated by the forest; `columns` is column-major and
    /// `indices` may repeat (bootstrap draws).
    pub(crate) fn grow(
        columns: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        n_classes: usize,
        params: TreeParams,
    ) -> Self {
        let mut grower = Grower {
            columns,
            labels,
            n_classes,
            params,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            arena: Vec::new(),
        };
        grower.grow(indices, 0);
        trace!(n_nodes = grower.arena.len(), "tree grown");
        Self {
            nodes: grower.arena,
            n_features: columns.len(),
        }
    }

    /// Class probabilities of the leaf reached by `sample`.
    ///
    /// The caller guarantees `sample.len() == n_features`.
    pub(crate) fn leaf_probs(&self, sample: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class_probs, .. } => return class_probs,
                Node::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Total Gini decrease attributed to each feature (unnormalized).
    #[must_use]
    pub fn impurity_decrease(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Branch { feature, gain, .. } = node {
                totals[feature.index()] += gain;
            }
        }
        totals
    }

    /// Return the arena nodes, root first.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the depth of the deepest leaf (a lone root leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Branch { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        deepest
    }
}
