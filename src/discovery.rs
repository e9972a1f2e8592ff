//! # Discovery Ranking Pipeline
//!
//! Finds "hidden gems": candidates that fit the aggregate vibe of the queue
//! and the event theme without being the most obvious, most popular picks.
//!
//! ## Pipeline
//!
//! 1. Aggregate the queue into a [`Fingerprint`] (empty queue: empty result)
//! 2. Drop candidates already queued
//! 3. Score synergy against the fingerprint and theme match against the event
//! 4. Keep synergy >= 0.5 within the popularity window
//! 5. Rank by `0.6 * synergy + 0.4 * theme / 100` and keep the top 15
//!
//! The candidate pool itself comes from the caller, which seeds its
//! recommendation fetch with [`select_seeds`] and batches the audio-feature
//! fetch with [`feature_batches`].

use crate::synergy;
use crate::track::{Fingerprint, Track};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Maximum number of seed tracks and genres for a recommendation request.
pub const MAX_SEEDS: usize = 5;

/// Maximum ids per audio-feature request.
pub const FEATURE_BATCH_SIZE: usize = 100;

/// Theme score used when the event has no usable words.
const NEUTRAL_THEME_MATCH: f64 = 50.0;

/// Shortest event word considered for theme matching.
const MIN_THEME_WORD_LEN: usize = 3;

/// Event metadata supplied by the event-management collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTheme {
    pub name: String,
    pub theme: Option<String>,
    pub description: Option<String>,
}

impl EventTheme {
    /// Distinct lowercase words of at least three characters.
    #[must_use]
    pub fn words(&self) -> BTreeSet<String> {
        std::iter::once(self.name.as_str())
            .chain(self.theme.as_deref())
            .chain(self.description.as_deref())
            .flat_map(|text| text.split(|c: char| !c.is_alphanumeric()))
            .filter(|word| word.chars().count() >= MIN_THEME_WORD_LEN)
            .map(str::to_lowercase)
            .collect()
    }
}

/// Tunable parameters of the discovery ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Inclusive popularity window
    pub min_popularity: u8,
    pub max_popularity: u8,
    pub min_synergy: f64,
    pub limit: usize,
    pub synergy_weight: f64,
    pub theme_weight: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_popularity: 20,
            max_popularity: 60,
            min_synergy: 0.5,
            limit: 15,
            synergy_weight: 0.6,
            theme_weight: 0.4,
        }
    }
}

/// A ranked discovery with its annotations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discovery {
    pub track: Track,
    /// Synergy score, 0-100
    pub synergy: u8,
    /// Theme match, 0-100
    pub theme_match: u8,
    /// Unrounded ranking value
    pub rank_score: f64,
    pub rationale: String,
}

impl AsRef<Track> for Discovery {
    fn as_ref(&self) -> &Track {
        &self.track
    }
}

/// Seeds for the caller's recommendation fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSelection {
    pub track_ids: Vec<String>,
    pub genres: Vec<String>,
}

/// Rank hidden gems with the default [`DiscoveryConfig`].
///
/// # Examples
///
/// ```
/// use setlist::discovery::{discover, EventTheme};
/// use setlist::track::Track;
///
/// let pool = vec![Track::new("1", "Song", "Artist")];
/// assert!(discover(&[], &pool, &EventTheme::default()).is_empty());
/// ```
#[must_use]
pub fn discover(queue: &[Track], pool: &[Track], theme: &EventTheme) -> Vec<Discovery> {
    discover_with(queue, pool, theme, &DiscoveryConfig::default())
}

/// Rank hidden gems from `pool` against the queue and event theme.
///
/// Candidates without usable audio features are silently excluded. Returns an
/// empty list when no fingerprint can be formed or nothing qualifies.
#[must_use]
pub fn discover_with(
    queue: &[Track],
    pool: &[Track],
    theme: &EventTheme,
    config: &DiscoveryConfig,
) -> Vec<Discovery> {
    let Some(fingerprint) = Fingerprint::from_tracks(queue) else {
        log::debug!("No fingerprint from {} queued tracks; nothing to discover", queue.len());
        return Vec::new();
    };

    let queued: HashSet<&str> = queue.iter().map(|t| t.id.as_str()).collect();
    let words = theme.words();

    log::debug!(
        "Discovery over {} candidates (fingerprint of {} tracks, {} theme words)",
        pool.len(),
        fingerprint.sample_size,
        words.len()
    );

    let mut ranked: Vec<(f64, f64, &Track, f64)> = pool
        .par_iter()
        .filter(|track| !queued.contains(track.id.as_str()))
        .filter(|track| (config.min_popularity..=config.max_popularity).contains(&track.popularity))
        .filter_map(|track| {
            let synergy = synergy::synergy_score(track, &fingerprint)?;
            if synergy < config.min_synergy {
                return None;
            }
            let theme_match = theme_match_words(track, &words);
            let rank = config.synergy_weight * synergy + config.theme_weight * (theme_match / 100.0);
            Some((rank, synergy, track, theme_match))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(config.limit);

    log::debug!("Discovery kept {} candidates", ranked.len());

    ranked
        .into_iter()
        .map(|(rank_score, synergy, track, theme_match)| Discovery {
            track: track.clone(),
            synergy: percent(synergy * 100.0),
            theme_match: percent(theme_match),
            rank_score,
            rationale: rationale(theme_match, synergy, track.popularity),
        })
        .collect()
}

/// How well a track's text matches the event theme, 0-100.
///
/// The share of event words found as substrings of the track's title,
/// artists and album. Events without usable words score a neutral 50.
#[must_use]
pub fn theme_match(track: &Track, theme: &EventTheme) -> f64 {
    theme_match_words(track, &theme.words())
}

#[allow(clippy::cast_precision_loss)]
fn theme_match_words(track: &Track, words: &BTreeSet<String>) -> f64 {
    if words.is_empty() {
        return NEUTRAL_THEME_MATCH;
    }
    let text = track.search_text();
    let hits = words.iter().filter(|word| text.contains(word.as_str())).count();
    hits as f64 / words.len() as f64 * 100.0
}

/// Human-readable reason a discovery was suggested.
#[must_use]
pub fn rationale(theme_match: f64, synergy: f64, popularity: u8) -> String {
    let theme = match theme_match {
        t if t >= 90.0 => "Perfect theme match",
        t if t >= 80.0 => "Excellent theme fit",
        _ => "Strong theme match",
    };
    let flow = match synergy {
        s if s >= 0.8 => Some("Musically compatible"),
        s if s >= 0.6 => Some("Good musical flow"),
        _ => None,
    };
    let reach = if popularity <= 40 { "Hidden gem" } else { "Under the radar" };

    std::iter::once(theme)
        .chain(flow)
        .chain(std::iter::once(reach))
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Pick up to five seed tracks (queue order) and five dominant genres.
///
/// Genres rank by how many queued tracks carry them, ties alphabetical.
#[must_use]
pub fn select_seeds(queue: &[Track]) -> SeedSelection {
    let mut seen = HashSet::new();
    let track_ids = queue
        .iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .take(MAX_SEEDS)
        .map(|t| t.id.clone())
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for genre in queue.iter().flat_map(|t| t.genres.iter()) {
        let genre = genre.trim().to_lowercase();
        if !genre.is_empty() {
            *counts.entry(genre).or_default() += 1;
        }
    }
    let mut genres: Vec<(String, usize)> = counts.into_iter().collect();
    genres.sort_by(|(a_name, a_count), (b_name, b_count)| b_count.cmp(a_count).then_with(|| a_name.cmp(b_name)));

    SeedSelection {
        track_ids,
        genres: genres.into_iter().take(MAX_SEEDS).map(|(g, _)| g).collect(),
    }
}

/// Split ids into request-sized batches for the audio-feature fetch.
pub fn feature_batches(ids: &[String]) -> impl Iterator<Item = &[String]> {
    ids.chunks(FEATURE_BATCH_SIZE)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
