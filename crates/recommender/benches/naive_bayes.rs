//! Benchmarks for training and prediction
//!
//! Run with: cargo bench --package recommender
//!
//! Uses a synthetic catalogue so no data files are needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{FeatureCatalog, FeatureCatalogBuilder, RatingMatrix};
use recommender::NaiveBayesRecommender;
use std::sync::Arc;

const ITEMS: usize = 2_000;
const FEATURES: usize = 300;
const USERS: usize = 500;

/// Each item gets 12 features chosen by a fixed stride pattern
fn synthetic_catalog() -> Arc<FeatureCatalog> {
    let mut builder = FeatureCatalogBuilder::new();
    for item in 0..ITEMS {
        let features: Vec<String> = (0..12)
            .map(|k| format!("f{}", (item * 7 + k * 31) % FEATURES))
            .collect();
        builder.add_item(&format!("item{}", item), features.as_slice());
    }
    Arc::new(builder.build())
}

/// Every user rates 60 items with ratings cycling through 1..=5
fn synthetic_ratings() -> RatingMatrix {
    let entries = (0..USERS).flat_map(|user| {
        (0..60).map(move |k| {
            let item = (user * 13 + k * 37) % ITEMS;
            let rating = ((user + k) % 5 + 1) as f64;
            (user, item, rating)
        })
    });
    RatingMatrix::from_entries(USERS, ITEMS, entries).expect("synthetic ratings are in range")
}

fn bench_train(c: &mut Criterion) {
    let catalog = synthetic_catalog();
    let ratings = synthetic_ratings();

    c.bench_function("train_all_users", |b| {
        b.iter(|| {
            let model = NaiveBayesRecommender::train(catalog.clone(), black_box(&ratings), 3.0)
                .expect("training failed");
            black_box(model)
        })
    });
}

fn bench_predict(c: &mut Criterion) {
    let catalog = synthetic_catalog();
    let ratings = synthetic_ratings();
    let model = NaiveBayesRecommender::train(catalog, &ratings, 3.0).expect("training failed");

    c.bench_function("predict_single", |b| {
        b.iter(|| black_box(model.predict(black_box(17), black_box(1234)).unwrap()))
    });

    c.bench_function("recommend_top_20", |b| {
        b.iter(|| black_box(model.recommend(black_box(17), &ratings, 20).unwrap()))
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);
