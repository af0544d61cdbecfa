//! Accuracy regression tests for cachexia-rf.
//!
//! A deterministic synthetic two-class dataset shaped like a metabolite panel:
//! a handful of informative log-scale concentrations among many noise columns.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use cachexia_rf::ForestConfig;

/// 120 samples, 12 features; features 0-2 shift by +1.5 for class 1.
fn make_panel() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut features = Vec::with_capacity(120);
    let mut labels = Vec::with_capacity(120);
    for i in 0..120 {
        let class = i % 2;
        labels.push(class);
        let row = (0..12)
            .map(|f| {
                let shift = if f < 3 { class as f64 * 1.5 } else { 0.0 };
                shift + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    let names = (0..12).map(|f| format!("m{f}")).collect();
    (features, labels, names)
}

fn accuracy(predicted: &[usize], truth: &[usize]) -> f64 {
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

#[test]
fn holdout_accuracy_above_threshold() {
    let (features, labels, names) = make_panel();
    let (train_x, test_x) = features.split_at(90);
    let (train_y, test_y) = labels.split_at(90);

    let fitted = ForestConfig::new(50)
        .unwrap()
        .with_seed(7)
        .fit(train_x, train_y, 2, &names)
        .unwrap();
    let predicted = fitted.forest().predict_batch(test_x).unwrap();
    let acc = accuracy(&predicted, test_y);
    assert!(acc > 0.8, "holdout accuracy {acc} <= 0.8");
}

#[test]
fn informative_features_lead_ranking() {
    let (features, labels, names) = make_panel();
    let fitted = ForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, 2, &names)
        .unwrap();
    let top3: Vec<&str> = fitted
        .importances()
        .iter()
        .take(3)
        .map(|f| f.name.as_str())
        .collect();
    let informative = top3
        .iter()
        .filter(|n| ["m0", "m1", "m2"].contains(n))
        .count();
    assert!(informative >= 2, "top-3 features: {top3:?}");
}

#[test]
fn tree_count_does_not_change_reproducibility() {
    let (features, labels, names) = make_panel();
    for n_trees in [5, 10, 55] {
        let config = ForestConfig::new(n_trees).unwrap().with_seed(1337);
        let a = config.fit(&features, &labels, 2, &names).unwrap();
        let b = config.fit(&features, &labels, 2, &names).unwrap();
        assert_eq!(
            a.forest().predict_batch(&features).unwrap(),
            b.forest().predict_batch(&features).unwrap(),
            "n_trees = {n_trees}"
        );
    }
}
