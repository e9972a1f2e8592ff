//! Synergy scoring between a candidate track and a queue fingerprint.
//!
//! The combined score blends four signals:
//!
//! ```text
//! synergy = clamp(0.6 * cosine + 0.2 * tempo + 0.1 * key + 0.1 * mood, 0, 1)
//! ```
//!
//! The weights are fixed so rankings are reproducible between runs.

use crate::key::{self, CamelotKey};
use crate::track::{AudioFeatures, Fingerprint, Mode, Track};
use serde::Serialize;

const COSINE_WEIGHT: f64 = 0.6;
const TEMPO_WEIGHT: f64 = 0.2;
const KEY_WEIGHT: f64 = 0.1;
const MOOD_WEIGHT: f64 = 0.1;

/// Dimension of the feature vector fed to cosine similarity.
pub const VECTOR_DIMENSIONS: usize = 10;

/// Per-signal components of a synergy score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SynergyBreakdown {
    pub cosine: f64,
    pub tempo: f64,
    pub key: f64,
    pub mood: f64,
    /// Weighted blend in `[0, 1]`
    pub score: f64,
}

/// Tiered step function on the absolute BPM difference.
#[must_use]
pub fn tempo_compatibility(a: f64, b: f64) -> f64 {
    match (a - b).abs() {
        d if d <= 5.0 => 1.0,
        d if d <= 10.0 => 0.8,
        d if d <= 20.0 => 0.6,
        d if d <= 30.0 => 0.4,
        _ => 0.2,
    }
}

/// Continuous key score, `1 - distance / 6`, ignoring polarity.
///
/// An unknown key on either side scores 0.
#[must_use]
pub fn key_compatibility(a: Option<CamelotKey>, b: Option<CamelotKey>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => 1.0 - f64::from(key::circular_distance(a.number(), b.number())) / 6.0,
        _ => 0.0,
    }
}

#[must_use]
pub fn mood_compatibility(energy_a: f64, valence_a: f64, energy_b: f64, valence_b: f64) -> f64 {
    1.0 - ((energy_a - energy_b).abs() + (valence_a - valence_b).abs()) / 2.0
}

/// Standard cosine similarity; 0 when either vector has zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Normalised feature vector used for cosine similarity.
///
/// Missing key or mode contribute 0 to their dimension.
#[must_use]
#[allow(clippy::too_many_arguments)]
fn vector(
    tempo: f64,
    key: Option<u8>,
    mode: Option<Mode>,
    danceability: f64,
    energy: f64,
    valence: f64,
    loudness: f64,
    acousticness: f64,
    instrumentalness: f64,
    speechiness: f64,
) -> [f64; VECTOR_DIMENSIONS] {
    [
        tempo / 200.0,
        key.map_or(0.0, |k| f64::from(k) / 11.0),
        mode.map_or(0.0, |m| f64::from(u8::from(m))),
        danceability,
        energy,
        valence,
        (loudness + 60.0) / 60.0,
        acousticness,
        instrumentalness,
        speechiness,
    ]
}

#[must_use]
pub fn features_vector(f: &AudioFeatures) -> [f64; VECTOR_DIMENSIONS] {
    vector(
        f.tempo,
        f.pitch_class(),
        f.mode,
        f.danceability,
        f.energy,
        f.valence,
        f.loudness,
        f.acousticness,
        f.instrumentalness,
        f.speechiness,
    )
}

#[must_use]
pub fn fingerprint_vector(fp: &Fingerprint) -> [f64; VECTOR_DIMENSIONS] {
    vector(
        fp.tempo,
        fp.key,
        fp.mode,
        fp.danceability,
        fp.energy,
        fp.valence,
        fp.loudness,
        fp.acousticness,
        fp.instrumentalness,
        fp.speechiness,
    )
}

/// Score a candidate's features against a fingerprint.
#[must_use]
pub fn synergy(features: &AudioFeatures, fingerprint: &Fingerprint) -> SynergyBreakdown {
    let cosine = cosine_similarity(&features_vector(features), &fingerprint_vector(fingerprint));
    let tempo = tempo_compatibility(features.tempo, fingerprint.tempo);
    let key = key_compatibility(features.camelot(), fingerprint.camelot());
    let mood = mood_compatibility(
        features.energy,
        features.valence,
        fingerprint.energy,
        fingerprint.valence,
    );

    let blended = COSINE_WEIGHT * cosine + TEMPO_WEIGHT * tempo + KEY_WEIGHT * key + MOOD_WEIGHT * mood;
    let score = if blended.is_finite() { blended.clamp(0.0, 1.0) } else { 0.0 };

    log::trace!("Synergy cosine={cosine:.3} tempo={tempo:.1} key={key:.3} mood={mood:.3} -> {score:.3}");

    SynergyBreakdown {
        cosine,
        tempo,
        key,
        mood,
        score,
    }
}

/// Synergy score of a track, or `None` when it has no usable features.
#[must_use]
pub fn synergy_score(track: &Track, fingerprint: &Fingerprint) -> Option<f64> {
    track
        .audio_features()
        .map(|features| synergy(features, fingerprint).score)
}
