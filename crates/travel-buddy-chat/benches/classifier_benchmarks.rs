//! Benchmarks for query classification and preference extraction.
//!
//! Both run on every routed query before the model call, so they should
//! stay well under a millisecond per query.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use travel_buddy_chat::{extract_preferences, TaskClassifier};

/// A mix of queries covering every rule plus the fallback.
fn sample_queries() -> Vec<String> {
    let templates = [
        "Where should I go for a long weekend in {}?",
        "What are the top attractions in {}?",
        "What should I pack for a beach trip to {}?",
        "Is the food in {} expensive compared to home?",
        "I love Thai food and I'm traveling with my kids to {}",
        "Plan a three day itinerary for {} with museums and hiking",
    ];
    let places = ["Lisbon", "Kyoto", "Cape Town", "Reykjavik", "Oaxaca"];

    (0..300)
        .map(|i| templates[i % templates.len()].replace("{}", places[i % places.len()]))
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let classifier = TaskClassifier::new();
    let queries = sample_queries();

    let mut group = c.benchmark_group("classifier");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("classify_single", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let task = classifier.classify(&queries[idx % queries.len()]);
            idx += 1;
            task
        });
    });

    group.bench_function("classify_detailed_batch_100", |b| {
        b.iter(|| {
            queries[..100]
                .iter()
                .map(|q| classifier.classify_detailed(q))
                .collect::<Vec<_>>()
        });
    });

    group.finish();
}

fn bench_extract_preferences(c: &mut Criterion) {
    let queries = sample_queries();

    let mut group = c.benchmark_group("preferences");
    group.sample_size(200);

    group.bench_function("extract_single", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let found = extract_preferences(&queries[idx % queries.len()]);
            idx += 1;
            found
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_extract_preferences);
criterion_main!(benches);
