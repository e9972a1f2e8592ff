//! # Integration Tests for Setlist
//!
//! End-to-end tests of the engine through its public API, plus the `setlist`
//! binary driven with JSON fixtures in temporary directories.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use setlist::discovery::{self, EventTheme};
use setlist::filter::{self, FeatureRange, FilterContext, SmartFilterConfig};
use setlist::harmonic::{self, PoolEntry};
use setlist::key::{self, CamelotKey, Tier};
use setlist::synergy;
use setlist::track::{AudioFeatures, Fingerprint, Mode, Track};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn features(tempo: f64, key: u8, mode: Mode, energy: f64) -> AudioFeatures {
    AudioFeatures {
        tempo,
        key: Some(key),
        mode: Some(mode),
        energy,
        danceability: 0.7,
        valence: 0.6,
        acousticness: 0.1,
        instrumentalness: 0.2,
        speechiness: 0.05,
        loudness: -7.0,
    }
}

/// A small house-music evening: queue in A minor territory, mixed pool
fn event_fixture() -> (Vec<Track>, Vec<Track>) {
    let queue = vec![
        Track::new("q1", "Sunset Groove", "Resident DJ").with_features(features(122.0, 9, Mode::Minor, 0.65)),
        Track::new("q2", "Rooftop", "Guest Act").with_features(features(124.0, 4, Mode::Minor, 0.7)),
        Track::new("q3", "Missing Data", "Someone"),
    ];

    let mut pool = vec![
        Track::new("p1", "Summer Rooftop Anthem", "New Face")
            .with_features(features(123.0, 9, Mode::Minor, 0.7))
            .with_popularity(35)
            .with_release_year(2019),
        Track::new("p2", "Chart Topper", "Big Star")
            .with_features(features(123.0, 9, Mode::Minor, 0.7))
            .with_popularity(92)
            .with_release_year(2023),
        Track::new("p3", "Late Groove", "Guest Act")
            .with_features(features(125.0, 0, Mode::Major, 0.68))
            .with_popularity(55)
            .with_release_year(2015),
        Track::new("p4", "Ballad", "Crooner")
            .with_features(AudioFeatures {
                tempo: 70.0,
                key: Some(3),
                mode: Some(Mode::Major),
                energy: 0.05,
                danceability: 0.1,
                valence: 0.1,
                acousticness: 0.95,
                instrumentalness: 0.9,
                speechiness: 0.9,
                loudness: -30.0,
            })
            .with_popularity(30),
        Track::new("p5", "No Features Yet", "Unknown").with_popularity(40),
    ];
    pool[0].explicit = true;
    pool.push(queue[0].clone().with_popularity(40));

    (queue, pool)
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_tracks_without_features() {
        let (queue, _) = event_fixture();
        let fp = Fingerprint::from_tracks(&queue).unwrap();
        assert_eq!(fp.sample_size, 2);
        assert!((fp.tempo - 123.0).abs() < 1e-9);
    }

    #[test]
    fn test_discovery_end_to_end() {
        let (queue, pool) = event_fixture();
        let theme = EventTheme {
            name: "Summer Rooftop Party".to_string(),
            theme: Some("sunset house".to_string()),
            description: None,
        };

        let gems = discovery::discover(&queue, &pool, &theme);
        let ids: Vec<&str> = gems.iter().map(|g| g.track.id.as_str()).collect();

        // p2 too popular, p4 too far, p5 missing features, q1 already queued
        assert_eq!(ids, vec!["p1", "p3"]);
        assert!(gems[0].theme_match > gems[1].theme_match);
        assert!(gems[0].rationale.contains("Hidden gem"));
        assert!(gems[1].rationale.contains("Under the radar"));
    }

    #[test]
    fn test_filters_apply_to_discoveries() {
        let (queue, pool) = event_fixture();
        let gems = discovery::discover(&queue, &pool, &EventTheme::default());

        let config = SmartFilterConfig {
            explicit_filter: true,
            repetition_cooldown: true,
            cooldown_minutes: 30,
            ..SmartFilterConfig::default()
        };
        let shown = filter::apply(gems, &config, &FilterContext::new(&queue, 2024));
        // p1 explicit, p3 by an artist heard in the queue
        assert!(shown.is_empty());
    }

    #[test]
    fn test_harmonic_flow_end_to_end() {
        let (queue, pool) = event_fixture();
        let entries: Vec<PoolEntry> = pool.into_iter().map(PoolEntry::from).collect();

        let flow = harmonic::harmonic_flow(&queue[0], &entries);
        let ids: Vec<&str> = flow.iter().map(|e| e.track.id.as_str()).collect();

        // Anchor 8A: p1/p2 perfect, p3 (8B) relative; q1 in the pool is the anchor itself
        assert_eq!(ids, vec!["q1", "p1", "p2", "p3"]);
        assert_eq!(flow[3].compatibility.unwrap().tier, Tier::Relative);
    }

    #[test]
    fn test_harmonic_flow_keyless_anchor() {
        let (queue, pool) = event_fixture();
        let entries: Vec<PoolEntry> = pool.iter().cloned().map(PoolEntry::from).collect();

        let flow = harmonic::harmonic_flow(&queue[2], &entries);
        assert_eq!(flow.len(), pool.len());
        assert!(flow.iter().zip(&pool).all(|(e, t)| &e.track == t));
    }

    #[test]
    fn test_documented_key_examples() {
        let k = |s: &str| CamelotKey::parse(s);
        assert_eq!(key::compatibility_tier(k("8A"), k("9A")).tier, Tier::EnergyBoost);
        assert_eq!(key::compatibility_tier(k("8A"), k("7A")).tier, Tier::EnergyDrop);
        let relative = key::compatibility_tier(k("8A"), k("8B"));
        assert_eq!((relative.score, relative.tier), (0.90, Tier::Relative));
        assert_ne!(
            key::compatibility_tier(k("8A"), k("9A")),
            key::compatibility_tier(k("9A"), k("8A"))
        );
        assert_eq!(synergy::tempo_compatibility(120.0, 128.0), 0.8);
    }

    #[test]
    fn test_synergy_always_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..500 {
            let random = |rng: &mut StdRng| AudioFeatures {
                tempo: rng.gen_range(40.0..220.0),
                key: rng.gen_bool(0.8).then(|| rng.gen_range(0..12)),
                mode: rng.gen_bool(0.8).then_some(Mode::Major),
                energy: rng.gen(),
                danceability: rng.gen(),
                valence: rng.gen(),
                acousticness: rng.gen(),
                instrumentalness: rng.gen(),
                speechiness: rng.gen(),
                loudness: rng.gen_range(-80.0..5.0),
            };
            let queued = Track::new("q", "Q", "A").with_features(random(&mut rng));
            let fp = Fingerprint::from_tracks([&queued]).unwrap();
            let candidate = random(&mut rng);
            let score = synergy::synergy(&candidate, &fp).score;
            assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn test_discovery_on_empty_queue_ignores_pool_size() {
        let (_, pool) = event_fixture();
        let big_pool: Vec<Track> = pool.iter().cycle().take(500).cloned().collect();
        assert!(discovery::discover(&[], &big_pool, &EventTheme::default()).is_empty());
    }

    #[test]
    fn test_filter_pipeline_with_everything_enabled() {
        let (queue, pool) = event_fixture();
        let config = SmartFilterConfig {
            explicit_filter: true,
            repetition_cooldown: true,
            cooldown_minutes: 3,
            era_filter: true,
            min_decade: 2010,
            max_decade: 2020,
            energy_range: FeatureRange::new(50, 100),
            danceability_range: FeatureRange::FULL,
            valence_range: FeatureRange::new(0, 90),
            vocal_focus: true,
        };
        let ctx = FilterContext::new(&queue, 2024);
        let once = filter::apply(pool, &config, &ctx);
        let twice = filter::apply(once.clone(), &config, &ctx);
        assert_eq!(once, twice);
        let ids: Vec<&str> = once.iter().map(|t| t.id.as_str()).collect();
        // Cooldown covers only q3's artist; p1 explicit, p4 and p5 fail the energy range
        assert_eq!(ids, vec!["p2", "p3", "q1"]);
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    fn binary() -> Command {
        Command::new(env!("CARGO_BIN_EXE_setlist"))
    }

    fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value)?)?;
        Ok(path)
    }

    /// Writes queue, pool and an empty settings file into a fresh directory
    fn fixture_dir() -> Result<(TempDir, PathBuf, PathBuf, PathBuf)> {
        let dir = TempDir::new()?;
        let (queue, pool) = event_fixture();
        let queue_path = write_json(dir.path(), "queue.json", &queue)?;
        let pool_path = write_json(dir.path(), "pool.json", &pool)?;
        let settings_path = dir.path().join("settings.json");
        std::fs::write(&settings_path, "{}")?;
        Ok((dir, queue_path, pool_path, settings_path))
    }

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = binary().arg("--help").output().expect("Failed to run help command");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("setlist"));
        assert!(stdout.contains("discover"));
        assert!(stdout.contains("flow"));
        assert!(stdout.contains("filter"));
        assert!(stdout.contains("compat"));
    }

    #[test]
    fn test_cli_version_flag() {
        let output = binary().arg("--version").output().expect("Failed to run version command");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("setlist"));
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_completion_generation() {
        let output = binary().args(["completion", "bash"]).output().expect("Failed to run completion command");
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_setlist"));
        assert!(stdout.contains("complete"));
    }

    #[test]
    fn test_compat_command() {
        let output = binary().args(["compat", "8A", "9A"]).output().expect("Failed to run compat");
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Energy boost"));
        assert!(stdout.contains("Am"));
    }

    #[test]
    fn test_compat_rejects_bad_key() {
        let output = binary().args(["compat", "8A", "13Z"]).output().expect("Failed to run compat");
        assert!(!output.status.success());
    }

    #[test]
    fn test_discover_json_output() -> Result<()> {
        let (_dir, queue, pool, settings) = fixture_dir()?;
        let output = binary()
            .arg("discover")
            .arg("--queue")
            .arg(&queue)
            .arg("--pool")
            .arg(&pool)
            .arg("--settings")
            .arg(&settings)
            .arg("--json")
            .output()?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let gems: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let ids: Vec<&str> = gems
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|g| g["track"]["id"].as_str())
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"p1"));
        Ok(())
    }

    #[test]
    fn test_discover_respects_settings_filters() -> Result<()> {
        let (_dir, queue, pool, settings) = fixture_dir()?;
        std::fs::write(&settings, r#"{"filters": {"explicit_filter": true}}"#)?;
        let output = binary()
            .args(["discover", "--json", "--queue"])
            .arg(&queue)
            .arg("--pool")
            .arg(&pool)
            .arg("--settings")
            .arg(&settings)
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains("\"p1\""));
        assert!(stdout.contains("\"p3\""));
        Ok(())
    }

    #[test]
    fn test_flow_with_relevance_pool() -> Result<()> {
        let (dir, queue, _pool, settings) = fixture_dir()?;
        let (q, p) = event_fixture();
        let entries = vec![
            PoolEntry::new(p[1].clone(), Some(0.1)),
            PoolEntry::new(p[0].clone(), Some(0.9)),
        ];
        let pool = write_json(dir.path(), "entries.json", &entries)?;
        let output = binary()
            .args(["flow", "--json", "--anchor", q[0].id.as_str(), "--pool"])
            .arg(&pool)
            .arg("--queue")
            .arg(&queue)
            .arg("--settings")
            .arg(&settings)
            .output()?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let flow: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let ids: Vec<&str> = flow
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["track"]["id"].as_str())
            .collect();
        // Equal tiers: higher relevance first
        assert_eq!(ids, vec!["q1", "p1", "p2"]);
        assert_eq!(flow[1]["compatibility"]["tier"], "perfect");
        Ok(())
    }

    #[test]
    fn test_flow_keeps_anchor_first_under_filters() -> Result<()> {
        let dir = TempDir::new()?;
        let track = |id: &str, key: u8, instrumentalness: f64| {
            Track::new(id, format!("Track {id}"), format!("Artist {id}")).with_features(AudioFeatures {
                instrumentalness,
                ..features(124.0, key, Mode::Minor, 0.7)
            })
        };
        // 9 minor is 8A, 4 minor is 9A
        let pool = vec![
            track("anchor", 9, 0.9).with_explicit(true),
            track("c1", 9, 0.0),
            track("c2", 4, 0.1),
            track("c3", 4, 0.05).with_explicit(true),
        ];
        let pool = write_json(dir.path(), "pool.json", &pool)?;
        let settings = dir.path().join("settings.json");
        std::fs::write(&settings, r#"{"filters": {"vocal_focus": true, "explicit_filter": true}}"#)?;

        let output = binary()
            .args(["flow", "--json", "--anchor", "anchor", "--pool"])
            .arg(&pool)
            .arg("--settings")
            .arg(&settings)
            .output()?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let flow: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let ids: Vec<&str> = flow
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["track"]["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["anchor", "c1", "c2"]);
        Ok(())
    }

    #[test]
    fn test_catalog_no_key_marker_is_accepted() -> Result<()> {
        let dir = TempDir::new()?;
        let queue = dir.path().join("queue.json");
        std::fs::write(
            &queue,
            r#"[{
                "id": "q1", "title": "Drone", "artists": ["Ambient Act"], "popularity": 140,
                "features": {
                    "tempo": 122.0, "key": -1, "mode": 0,
                    "energy": 0.6, "danceability": 0.7, "valence": 0.5,
                    "acousticness": 0.2, "instrumentalness": 0.8,
                    "speechiness": 0.04, "loudness": -9.0
                }
            }]"#,
        )?;
        let settings = dir.path().join("settings.json");
        std::fs::write(&settings, "{}")?;

        let output = binary()
            .args(["filter", "--json", "--tracks"])
            .arg(&queue)
            .arg("--settings")
            .arg(&settings)
            .output()?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let kept: Vec<Track> = serde_json::from_slice(&output.stdout)?;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].camelot_label(), None);
        assert_eq!(kept[0].popularity, 100);
        Ok(())
    }

    #[test]
    fn test_flow_unknown_anchor_fails() -> Result<()> {
        let (_dir, _queue, pool, settings) = fixture_dir()?;
        let output = binary()
            .args(["flow", "--anchor", "missing", "--pool"])
            .arg(&pool)
            .arg("--settings")
            .arg(&settings)
            .output()?;
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("missing"));
        Ok(())
    }

    #[test]
    fn test_seeds_command() -> Result<()> {
        let (_dir, queue, _pool, _settings) = fixture_dir()?;
        let output = binary().arg("seeds").arg("--queue").arg(&queue).output()?;
        assert!(output.status.success());
        let seeds: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(seeds["track_ids"], serde_json::json!(["q1", "q2", "q3"]));
        Ok(())
    }
}
