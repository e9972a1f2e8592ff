//! # Smart Filter Pipeline
//!
//! User-configurable constraints applied to any track list before display.
//!
//! Stages run in a fixed order, each on the output of the previous one:
//!
//! 1. [`Stage::Explicit`] - drop explicit tracks
//! 2. [`Stage::Cooldown`] - drop artists heard in the recent queue
//! 3. [`Stage::Era`] - keep release decades within a range
//! 4. [`Stage::Energy`], [`Stage::Danceability`], [`Stage::Valence`] - inclusive 0-100 ranges
//! 5. [`Stage::VocalFocus`] - stable sort, vocal-forward tracks first
//!
//! A disabled stage leaves the list untouched, so the pipeline with every
//! option off is the identity. Re-applying the pipeline to its own output
//! with the same config and context changes nothing.
//!
//! ## Examples
//!
//! ```
//! use setlist::filter::{apply, FilterContext, SmartFilterConfig};
//! use setlist::track::Track;
//!
//! let tracks = vec![
//!     Track::new("1", "Clean", "Artist"),
//!     Track::new("2", "Dirty", "Artist").with_explicit(true),
//! ];
//! let config = SmartFilterConfig {
//!     explicit_filter: true,
//!     ..SmartFilterConfig::default()
//! };
//!
//! let kept = apply(tracks, &config, &FilterContext::new(&[], 2024));
//! assert_eq!(kept.len(), 1);
//! ```

use crate::track::{AudioFeatures, Track};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Assumed average track length when converting a cooldown to queue entries.
const MINUTES_PER_TRACK: u32 = 3;

/// Instrumentalness assumed for tracks without features when sorting.
const DEFAULT_INSTRUMENTALNESS: f64 = 0.5;

/// Inclusive range on a 0-100 feature scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: u8,
    pub max: u8,
}

impl FeatureRange {
    pub const FULL: Self = Self { min: 0, max: 100 };

    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// A full range filters nothing.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.min == 0 && self.max >= 100
    }

    /// Whether a 0-1 feature value, scaled to 0-100, lies in the range
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        // 0.9 * 100.0 is 90.00000000000001; compare at micro precision
        let scaled = (value * 100.0 * 1e6).round() / 1e6;
        scaled >= f64::from(self.min) && scaled <= f64::from(self.max)
    }
}

impl Default for FeatureRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// User settings for the smart filters.
///
/// Every field defaults, so a partial settings file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartFilterConfig {
    /// Drop tracks flagged explicit
    pub explicit_filter: bool,
    /// Drop artists heard within the cooldown window
    pub repetition_cooldown: bool,
    pub cooldown_minutes: u32,
    /// Keep only release decades in `[min_decade, max_decade]`
    pub era_filter: bool,
    pub min_decade: i32,
    pub max_decade: i32,
    pub energy_range: FeatureRange,
    pub danceability_range: FeatureRange,
    pub valence_range: FeatureRange,
    /// Surface vocal-forward tracks first
    pub vocal_focus: bool,
}

impl Default for SmartFilterConfig {
    fn default() -> Self {
        Self {
            explicit_filter: false,
            repetition_cooldown: false,
            cooldown_minutes: 30,
            era_filter: false,
            min_decade: 1960,
            max_decade: 2020,
            energy_range: FeatureRange::FULL,
            danceability_range: FeatureRange::FULL,
            valence_range: FeatureRange::FULL,
            vocal_focus: false,
        }
    }
}

impl SmartFilterConfig {
    /// Whether any stage would touch the list
    #[must_use]
    pub fn is_active(&self) -> bool {
        Stage::ALL.iter().any(|stage| stage.is_enabled(self))
    }
}

/// Data the stages read besides the config
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Queue in play order, most recent last
    pub recent: &'a [Track],
    /// Stands in for tracks without a release year
    pub current_year: i32,
}

impl<'a> FilterContext<'a> {
    #[must_use]
    pub const fn new(recent: &'a [Track], current_year: i32) -> Self {
        Self { recent, current_year }
    }

    /// Context using the local clock's year.
    #[must_use]
    pub fn now(recent: &'a [Track]) -> Self {
        Self::new(recent, chrono::Local::now().year())
    }
}

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Explicit,
    Cooldown,
    Era,
    Energy,
    Danceability,
    Valence,
    VocalFocus,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::Explicit,
        Self::Cooldown,
        Self::Era,
        Self::Energy,
        Self::Danceability,
        Self::Valence,
        Self::VocalFocus,
    ];

    #[must_use]
    pub fn is_enabled(self, config: &SmartFilterConfig) -> bool {
        match self {
            Self::Explicit => config.explicit_filter,
            Self::Cooldown => config.repetition_cooldown && cooldown_entries(config) > 0,
            Self::Era => config.era_filter,
            Self::Energy => !config.energy_range.is_full(),
            Self::Danceability => !config.danceability_range.is_full(),
            Self::Valence => !config.valence_range.is_full(),
            Self::VocalFocus => config.vocal_focus,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Explicit => "explicit",
            Self::Cooldown => "cooldown",
            Self::Era => "era",
            Self::Energy => "energy",
            Self::Danceability => "danceability",
            Self::Valence => "valence",
            Self::VocalFocus => "vocal focus",
        };
        f.write_str(name)
    }
}

/// How many items each enabled stage removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub input: usize,
    pub output: usize,
    pub removed: Vec<(Stage, usize)>,
}

/// Run the pipeline over `items`.
///
/// Generic over anything exposing a [`Track`], so plain tracks, discoveries
/// and flow entries filter the same way.
#[must_use]
pub fn apply<T: AsRef<Track>>(items: Vec<T>, config: &SmartFilterConfig, ctx: &FilterContext<'_>) -> Vec<T> {
    apply_with_report(items, config, ctx).0
}

/// Run the pipeline and report per-stage removals.
pub fn apply_with_report<T: AsRef<Track>>(
    items: Vec<T>,
    config: &SmartFilterConfig,
    ctx: &FilterContext<'_>,
) -> (Vec<T>, FilterReport) {
    let mut report = FilterReport {
        input: items.len(),
        ..FilterReport::default()
    };

    let items = Stage::ALL
        .into_iter()
        .filter(|stage| stage.is_enabled(config))
        .fold(items, |items, stage| {
            let before = items.len();
            let items = run_stage(stage, items, config, ctx);
            report.removed.push((stage, before - items.len()));
            items
        });

    report.output = items.len();
    log::debug!(
        "Smart filters kept {}/{} tracks ({:?})",
        report.output,
        report.input,
        report.removed
    );

    (items, report)
}

fn run_stage<T: AsRef<Track>>(
    stage: Stage,
    items: Vec<T>,
    config: &SmartFilterConfig,
    ctx: &FilterContext<'_>,
) -> Vec<T> {
    match stage {
        Stage::Explicit => retain(items, |t| !t.explicit),
        Stage::Cooldown => {
            let recent = recent_artists(ctx.recent, cooldown_entries(config));
            retain(items, |t| !t.artists.iter().any(|a| recent.contains(&normalize_artist(a))))
        }
        Stage::Era => retain(items, |t| {
            let decade = decade_of(t.release_year.unwrap_or(ctx.current_year));
            (config.min_decade..=config.max_decade).contains(&decade)
        }),
        Stage::Energy => in_range(items, config.energy_range, |f| f.energy),
        Stage::Danceability => in_range(items, config.danceability_range, |f| f.danceability),
        Stage::Valence => in_range(items, config.valence_range, |f| f.valence),
        Stage::VocalFocus => {
            let mut items = items;
            items.sort_by(|a, b| instrumentalness(a.as_ref()).total_cmp(&instrumentalness(b.as_ref())));
            items
        }
    }
}

fn retain<T: AsRef<Track>>(mut items: Vec<T>, keep: impl Fn(&Track) -> bool) -> Vec<T> {
    items.retain(|item| keep(item.as_ref()));
    items
}

/// Tracks without features cannot be placed in a range and are dropped.
fn in_range<T: AsRef<Track>>(items: Vec<T>, range: FeatureRange, value: fn(&AudioFeatures) -> f64) -> Vec<T> {
    retain(items, |t| t.audio_features().is_some_and(|f| range.contains(value(f))))
}

/// Number of trailing queue entries covered by the cooldown
const fn cooldown_entries(config: &SmartFilterConfig) -> usize {
    (config.cooldown_minutes / MINUTES_PER_TRACK) as usize
}

fn recent_artists(queue: &[Track], entries: usize) -> HashSet<String> {
    let start = queue.len().saturating_sub(entries);
    queue[start..]
        .iter()
        .flat_map(|t| t.artists.iter())
        .map(|a| normalize_artist(a))
        .collect()
}

fn normalize_artist(artist: &str) -> String {
    artist.trim().to_lowercase()
}

/// `floor(year / 10) * 10`
#[must_use]
pub const fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

fn instrumentalness(track: &Track) -> f64 {
    track
        .audio_features()
        .map_or(DEFAULT_INSTRUMENTALNESS, |f| f.instrumentalness)
}
