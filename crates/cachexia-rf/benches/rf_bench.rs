//! Criterion benchmarks for cachexia-rf at the size of one training partition.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use cachexia_rf::ForestConfig;

fn make_panel(n_samples: usize, n_features: usize) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let labels: Vec<usize> = (0..n_samples).map(|i| i % 2).collect();
    let features = labels
        .iter()
        .map(|&class| {
            (0..n_features)
                .map(|f| (if f < 5 { class as f64 } else { 0.0 }) + rng.r#gen::<f64>())
                .collect()
        })
        .collect();
    let names = (0..n_features).map(|f| format!("m{f}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_panel(62, 64);
    for n_trees in [10, 100] {
        let config = ForestConfig::new(n_trees).unwrap();
        c.bench_function(&format!("rf_train_62x64_{n_trees}trees"), |b| {
            b.iter(|| config.fit(&features, &labels, 2, &names).unwrap());
        });
    }
}

fn bench_predict(c: &mut Criterion) {
    let (features, labels, names) = make_panel(62, 64);
    let fitted = ForestConfig::new(100)
        .unwrap()
        .fit(&features, &labels, 2, &names)
        .unwrap();
    c.bench_function("rf_predict_proba_62x64_100trees", |b| {
        b.iter(|| fitted.forest().predict_proba_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);
