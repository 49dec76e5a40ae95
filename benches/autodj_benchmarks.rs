//! Benchmarks for the Generate pipeline's hot paths: candidate filtering
//! and full playlist builds over libraries of varying size (spec §5:
//! "O(n^2) work over library size ... always far under a second").

use autodj::clock::FixedClock;
use autodj::selector::{SelectionConstraints, Selector, Strategy};
use autodj::store::SqliteStore;
use autodj::track::Track;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn build_library(store: &SqliteStore, size: usize) {
    let keys = ["1A", "1B", "2A", "2B", "3A", "3B", "4A", "4B"];
    for i in 0..size {
        let bpm = 120.0 + (i % 20) as f64;
        let key = keys[i % keys.len()];
        store
            .upsert_track(
                &Track::minimal(format!("t{i}"), format!("/music/{i}.flac"), 220.0)
                    .with_bpm(bpm)
                    .with_key(key)
                    .with_energy(((i % 10) as f64) / 10.0),
            )
            .unwrap();
    }
}

fn bench_build_playlist(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_build_playlist");
    for size in [50usize, 500, 5000] {
        let store = SqliteStore::open_in_memory().unwrap();
        build_library(&store, size);
        let library = store.list_tracks().unwrap();
        let clock = FixedClock("2026-01-01T00:00:00Z".parse().unwrap());
        let constraints = SelectionConstraints::default();

        group.bench_with_input(BenchmarkId::new("balanced", size), &size, |b, _| {
            let selector = Selector::new(&store, &clock, constraints, Strategy::Balanced);
            b.iter(|| {
                let outcome = selector.build_playlist(&library, "t0", 1800.0, 90).unwrap();
                black_box(outcome.playlist.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("energy_curve", size), &size, |b, _| {
            let selector = Selector::new(&store, &clock, constraints, Strategy::EnergyCurve);
            b.iter(|| {
                let outcome = selector.build_playlist(&library, "t0", 1800.0, 90).unwrap();
                black_box(outcome.playlist.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_playlist);
criterion_main!(benches);
