//! End-to-end growth scenarios on small glyph-like samples.

use rstest::rstest;

use saboten::repr::same_label_set;
use saboten::testing::{
    identity_router, scenario_conflicting, scenario_conflicting_then_separable,
    scenario_separable, select, window_means,
};
use saboten::training::Verbosity;
use saboten::{FeatureRouter, Generator, GeneratorConfig, LeafLabel, Model};

fn generator(seed: u64) -> Generator {
    Generator::new(
        GeneratorConfig::builder()
            .seed(seed)
            .verbosity(Verbosity::Debug)
            .build(),
    )
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Single call
// =============================================================================

#[rstest]
fn separable_samples_get_their_own_labels(#[values(0, 1, 2, 3, 17, 1234)] seed: u64) {
    init_logging();
    let (samples, labels) = scenario_separable();
    let model = Model::new(identity_router(2));

    let model = generator(seed).generate(&model, &samples, &labels).unwrap();

    for (sample, label) in samples.iter().zip(&labels) {
        assert_eq!(model.predict(sample).unwrap(), &LeafLabel::Single(*label));
    }
    model.tree().validate().unwrap();
}

#[rstest]
fn conflicting_samples_share_an_ambiguous_leaf(#[values(0, 1, 2, 3, 17, 1234)] seed: u64) {
    init_logging();
    let (samples, labels) = scenario_conflicting();
    let model = Model::new(identity_router(2));

    let (model, report) = generator(seed)
        .generate_with_report(&model, &samples, &labels)
        .unwrap();

    let (first, _) = model.predict_leaf(&samples[0]).unwrap();
    let (second, _) = model.predict_leaf(&samples[1]).unwrap();
    assert_eq!(first, second);
    assert!(first.label().is_ambiguous());
    assert!(same_label_set(first.label().labels(), &[54, 42]));

    // The split of the shared leaf has nothing to separate.
    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected, 1);
    assert_eq!(model.tree().n_leaves(), 2);
}

// =============================================================================
// Incremental calls
// =============================================================================

#[rstest]
fn later_sample_splits_off_the_ambiguous_leaf(#[values(0, 1, 2, 3, 17, 1234)] seed: u64) {
    init_logging();
    let (samples, labels) = scenario_conflicting_then_separable();
    let mut gen = generator(seed);

    let model = Model::new(identity_router(2));
    let model = gen.generate_at(&model, &samples, &labels, &[0, 1]).unwrap();
    let before = model.tree().n_leaves();

    let model = gen.generate_at(&model, &samples, &labels, &[2]).unwrap();

    let (new_leaf, _) = model.predict_leaf(&samples[2]).unwrap();
    assert_eq!(new_leaf.label(), &LeafLabel::Single(42));

    let (first, _) = model.predict_leaf(&samples[0]).unwrap();
    let (second, _) = model.predict_leaf(&samples[1]).unwrap();
    assert_eq!(first, second);
    assert_ne!(first, new_leaf);
    assert!(same_label_set(first.label().labels(), &[54, 42]));

    assert_eq!(model.tree().n_leaves(), before + 1);
    model.tree().validate().unwrap();
}

#[test]
fn snapshots_survive_later_generations() {
    let (samples, labels) = scenario_conflicting_then_separable();
    let mut gen = generator(5);

    let first = gen
        .generate_at(&Model::new(identity_router(2)), &samples, &labels, &[0, 1])
        .unwrap();
    let second = gen.generate_at(&first, &samples, &labels, &[2]).unwrap();

    assert_eq!(first.tree().n_leaves(), 2);
    assert!(first.predict(&samples[2]).unwrap().is_ambiguous());
    assert_eq!(second.predict(&samples[2]).unwrap(), &LeafLabel::Single(42));
}

#[test]
fn incremental_samples_are_cached_on_their_leaf() {
    let (samples, labels) = scenario_separable();
    let mut gen = generator(0);

    let model = gen
        .generate_at(&Model::new(identity_router(2)), &samples, &labels, &[0, 1])
        .unwrap();
    let model = gen.generate_at(&model, &samples, &labels, &[2]).unwrap();

    let (leaf, cache) = model.predict_leaf(&samples[2]).unwrap();
    let data = model.train_data(leaf).unwrap();
    assert!(data.labels().contains(&42));
    assert!(cache.n_fetched() > 0);
}

// =============================================================================
// Threads and transformers
// =============================================================================

#[rstest]
#[case(0)]
#[case(2)]
#[case(4)]
fn threaded_routing_matches_sequential(#[case] n_threads: usize) {
    let (samples, labels) = saboten::testing::random_samples(60, 3, 3, 11);
    let (first, rest) = samples.split_at(20);
    let (first_labels, rest_labels) = labels.split_at(20);

    let grow = |threads: usize| {
        let config = GeneratorConfig::builder()
            .seed(3)
            .n_threads(threads)
            .build();
        let mut gen = Generator::new(config);
        let model = gen
            .generate(&Model::new(identity_router(3)), first, first_labels)
            .unwrap();
        gen.generate(&model, rest, rest_labels).unwrap()
    };

    let sequential = grow(1);
    let threaded = grow(n_threads);
    for sample in &samples {
        assert_eq!(
            sequential.predict(sample).unwrap(),
            threaded.predict(sample).unwrap()
        );
    }
    assert_eq!(sequential.tree().n_nodes(), threaded.tree().n_nodes());
}

#[test]
fn grows_over_chained_transformers() {
    let router = FeatureRouter::new(
        vec![select(vec![1]), window_means(2), select(vec![0, 2])],
        &[0.0, 0.0, 0.0],
    );
    assert_eq!(router.total_output_features(), 5);

    let samples = saboten::testing::samples(&[
        &[0.0, 10.0, 0.0],
        &[5.0, 0.0, 5.0],
        &[9.0, 9.0, 9.0],
    ]);
    let labels = ['x', 'y', 'z'];

    let model = generator(8)
        .generate(&Model::new(router), &samples, &labels)
        .unwrap();
    for (sample, label) in samples.iter().zip(labels) {
        assert_eq!(model.predict(sample).unwrap(), &LeafLabel::Single(label));
    }
}
