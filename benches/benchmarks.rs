use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::hint::black_box;

use datastore::util::merge;
use datastore::DataStore;

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| DataStore::new(black_box(json!({ "count": 0, "name": "test" }))));
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store = DataStore::new(json!({ "count": 42 }));

    c.bench_function("store_read", |b| {
        b.iter(|| {
            black_box(store.get_state());
        });
    });
}

fn merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for key_count in [4usize, 64, 1024].iter() {
        let base = (0..*key_count)
            .map(|i| (format!("key{i}"), json!(i)))
            .collect();
        let partial = json!({ "key0": "changed", "extra": true });
        let partial = partial.as_object().cloned().unwrap_or_default();

        group.bench_with_input(BenchmarkId::from_parameter(key_count), key_count, |b, _| {
            b.iter(|| black_box(merge(&base, &partial)));
        });
    }
    group.finish();
}

fn store_update_benchmark(c: &mut Criterion) {
    let store = DataStore::new(json!({ "counter": 0, "name": "test" }));

    c.bench_function("store_update", |b| {
        let mut i = 0;
        b.iter(|| {
            store.set_state(json!({ "counter": black_box(i) }));
            i += 1;
        });
    });
}

fn store_notify_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_notify");

    for listener_count in [1, 10, 100].iter() {
        let store = DataStore::new(json!({ "value": 0 }));

        for _ in 0..*listener_count {
            store.watch("stateChanged", || {
                // Empty listener
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(listener_count),
            listener_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    store.set_state(json!({ "value": black_box(i) }));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    store_creation_benchmark,
    store_read_benchmark,
    merge_benchmark,
    store_update_benchmark,
    store_notify_benchmark,
);
criterion_main!(benches);
