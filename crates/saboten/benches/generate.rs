//! Generation benchmarks: split search, initial builds and incremental
//! ingestion.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use saboten::testing::{identity, random_samples, window_means};
use saboten::training::find_best_split;
use saboten::{FeatureRouter, Generator, GeneratorConfig, Model, TrainDataCache};

const N_COLUMNS: usize = 64;

fn default_criterion() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3))
        .sample_size(30)
}

fn router() -> FeatureRouter {
    FeatureRouter::new(
        vec![identity(), window_means(4), window_means(16)],
        &[0.0; N_COLUMNS],
    )
}

// =============================================================================
// Split search
// =============================================================================

fn bench_split_search(c: &mut Criterion) {
    let router = router();
    let mut group = c.benchmark_group("split/find_best");

    for n_rows in [100, 1_000, 10_000] {
        let (samples, labels) = random_samples(n_rows, N_COLUMNS, 8, 42);
        let data = TrainDataCache::from_parts(samples, labels);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &data, |b, data| {
            b.iter(|| {
                let mut data = data.clone();
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
                black_box(find_best_split(&mut data, &router, &mut rng).ok())
            })
        });
    }

    group.finish();
}

// =============================================================================
// Generation
// =============================================================================

fn bench_initial_build(c: &mut Criterion) {
    let model = Model::new(router());
    let mut group = c.benchmark_group("generate/initial");

    for n_rows in [100, 1_000] {
        let (samples, labels) = random_samples(n_rows, N_COLUMNS, 8, 7);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &n_rows, |b, _| {
            b.iter(|| {
                let mut generator = Generator::new(GeneratorConfig::default());
                black_box(generator.generate(&model, &samples, &labels).ok())
            })
        });
    }

    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let (samples, labels) = random_samples(2_000, N_COLUMNS, 8, 11);
    let (base, batch) = samples.split_at(1_000);
    let (base_labels, batch_labels) = labels.split_at(1_000);

    let mut group = c.benchmark_group("generate/incremental");
    group.throughput(Throughput::Elements(batch.len() as u64));

    for n_threads in [1, 2, 4] {
        let config = GeneratorConfig::builder().n_threads(n_threads).build();
        let Ok(model) = Generator::new(config.clone()).generate(&Model::new(router()), base, base_labels) else {
            continue;
        };

        group.bench_with_input(BenchmarkId::new("threads", n_threads), &model, |b, model| {
            b.iter(|| {
                let mut generator = Generator::new(config.clone());
                black_box(generator.generate(model, batch, batch_labels).ok())
            })
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_split_search, bench_initial_build, bench_incremental
}
criterion_main!(benches);
