//! Random forest classification: train, predict, rank features.
//!
//! CART trees with Gini splits and per-split feature subsampling, grown on
//! bootstrap samples in parallel via rayon. Every random draw descends from a
//! single master seed, so a given config and dataset always yield the same
//! forest.

mod config;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::ForestError;
pub use forest::{FittedForest, RandomForest};
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use predict::ClassProbabilities;
pub use split::gini;
pub use tree::DecisionTree;
