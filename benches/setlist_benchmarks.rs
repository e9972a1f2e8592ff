//! # Setlist Performance Benchmarks
//!
//! Benchmarks for the engine's hot paths, sized like a real event: a queue of
//! a few dozen tracks and candidate pools of up to a couple thousand.
//!
//! ## Benchmark Categories
//!
//! - **Synergy**: Single-track scoring and fingerprint aggregation
//! - **Discovery**: Full hidden-gem ranking over growing pools
//! - **Filters**: Smart filter pipeline with every stage enabled
//! - **Harmonic Flow**: Key classification and ordering from an anchor
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench discovery
//! cargo bench harmonic_flow
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use setlist::discovery::{self, EventTheme};
use setlist::filter::{self, FeatureRange, FilterContext, SmartFilterConfig};
use setlist::harmonic::{self, PoolEntry};
use setlist::synergy;
use setlist::track::{AudioFeatures, Fingerprint, Mode, Track};
use std::hint::black_box;

const ARTISTS: [&str; 8] = [
    "Night Drive", "Low Tide", "Velvet Room", "Glass Arcade", "Paper Moons", "Solar Choir", "Kite Club", "Dust Motel",
];

const WORDS: [&str; 10] = [
    "summer", "night", "rooftop", "echo", "neon", "river", "gold", "static", "bloom", "harbor",
];

/// Deterministic synthetic tracks with realistic feature spreads
fn create_test_tracks(count: usize, seed: u64) -> Vec<Track> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let title = format!("{} {}", WORDS[rng.gen_range(0..WORDS.len())], WORDS[rng.gen_range(0..WORDS.len())]);
            let artist = ARTISTS[rng.gen_range(0..ARTISTS.len())];
            let mut track = Track::new(format!("track{i}"), title, artist)
                .with_popularity(rng.gen_range(0..=100))
                .with_release_year(rng.gen_range(1965..=2024));
            track.explicit = rng.gen_bool(0.15);
            track.genres = vec![if i % 3 == 0 { "house" } else { "disco" }.to_string()];
            if rng.gen_bool(0.95) {
                track = track.with_features(AudioFeatures {
                    tempo: rng.gen_range(90.0..140.0),
                    key: Some(rng.gen_range(0..12)),
                    mode: Some(if rng.gen_bool(0.5) { Mode::Major } else { Mode::Minor }),
                    energy: rng.gen(),
                    danceability: rng.gen(),
                    valence: rng.gen(),
                    acousticness: rng.gen(),
                    instrumentalness: rng.gen(),
                    speechiness: rng.gen_range(0.0..0.3),
                    loudness: rng.gen_range(-20.0..-3.0),
                });
            }
            track
        })
        .collect()
}

fn benchmark_synergy(c: &mut Criterion) {
    let mut group = c.benchmark_group("synergy");

    let queue = create_test_tracks(30, 1);
    let pool = create_test_tracks(1, 2);
    let Some(fingerprint) = Fingerprint::from_tracks(&queue) else {
        return;
    };

    group.bench_function("single_track_score", |b| {
        b.iter(|| synergy::synergy_score(black_box(&pool[0]), black_box(&fingerprint)));
    });

    group.bench_function("fingerprint_30_tracks", |b| {
        b.iter(|| Fingerprint::from_tracks(black_box(&queue)));
    });

    group.finish();
}

fn benchmark_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    let queue = create_test_tracks(30, 3);
    let theme = EventTheme {
        name: "Summer Rooftop Night".to_string(),
        theme: Some("neon harbor".to_string()),
        description: Some("Gold hour into late night".to_string()),
    };

    for size in [100, 500, 1000, 2000] {
        let pool = create_test_tracks(size, 4);
        group.bench_with_input(BenchmarkId::new("discover", size), &pool, |b, pool| {
            b.iter(|| discovery::discover(black_box(&queue), black_box(pool), black_box(&theme)));
        });
    }

    group.bench_function("select_seeds", |b| {
        b.iter(|| discovery::select_seeds(black_box(&queue)));
    });

    group.finish();
}

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    let queue = create_test_tracks(30, 5);
    let pool = create_test_tracks(1000, 6);
    let config = SmartFilterConfig {
        explicit_filter: true,
        repetition_cooldown: true,
        cooldown_minutes: 30,
        era_filter: true,
        min_decade: 1980,
        max_decade: 2020,
        energy_range: FeatureRange::new(30, 90),
        danceability_range: FeatureRange::new(20, 100),
        valence_range: FeatureRange::FULL,
        vocal_focus: true,
    };
    let ctx = FilterContext::new(&queue, 2024);

    group.bench_function("all_stages_1000_tracks", |b| {
        b.iter_batched(
            || pool.clone(),
            |tracks| filter::apply(tracks, black_box(&config), black_box(&ctx)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("inactive_1000_tracks", |b| {
        b.iter_batched(
            || pool.clone(),
            |tracks| filter::apply(tracks, black_box(&SmartFilterConfig::default()), black_box(&ctx)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_harmonic_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("harmonic_flow");

    let mut rng = StdRng::seed_from_u64(7);
    let anchor = create_test_tracks(1, 8).remove(0).with_features(AudioFeatures {
        key: Some(9),
        mode: Some(Mode::Minor),
        ..AudioFeatures::default()
    });

    for size in [50, 500, 2000] {
        let pool: Vec<PoolEntry> = create_test_tracks(size, 9)
            .into_iter()
            .map(|t| PoolEntry::new(t, rng.gen_bool(0.5).then(|| rng.gen())))
            .collect();
        group.bench_with_input(BenchmarkId::new("flow", size), &pool, |b, pool| {
            b.iter(|| harmonic::harmonic_flow(black_box(&anchor), black_box(pool)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_synergy,
    benchmark_discovery,
    benchmark_filters,
    benchmark_harmonic_flow
);
criterion_main!(benches);
