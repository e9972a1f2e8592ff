//! # Track & Fingerprint Model
//!
//! Plain data handed to the engine by the catalog collaborator, plus the
//! aggregated [`Fingerprint`] of a set of tracks.
//!
//! Audio features are best-effort. A track whose features could not be
//! fetched has `features: None`, which is never the same as a measured zero.

use crate::key::{self, CamelotKey};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Major/minor mode, serialized as the catalog's integer (`1` major, `0` minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    Minor = 0,
    Major = 1,
}

/// Error returned for a mode value other than 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid mode {0} (expected 0 or 1)")]
pub struct InvalidMode(pub u8);

impl TryFrom<u8> for Mode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Minor),
            1 => Ok(Self::Major),
            other => Err(InvalidMode(other)),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode as u8
    }
}

impl Mode {
    fn as_f64(self) -> f64 {
        f64::from(u8::from(self))
    }
}

/// Measured audio features of one track.
///
/// The 0-1 features follow the catalog's normalisation; loudness is in dB,
/// typically -60..0. The catalog's "no key detected" (`-1`) and any other
/// out-of-range key or mode deserialize as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Beats per minute
    pub tempo: f64,
    /// Pitch class of the root, 0=C ... 11=B
    #[serde(default, deserialize_with = "lenient_key")]
    pub key: Option<u8>,
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: Option<Mode>,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    pub loudness: f64,
}

impl AudioFeatures {
    /// Whether every measurement can be used in arithmetic.
    ///
    /// Non-finite values and a non-positive tempo mark the whole set as absent.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.tempo.is_finite()
            && self.tempo > 0.0
            && [
                self.energy,
                self.danceability,
                self.valence,
                self.acousticness,
                self.instrumentalness,
                self.speechiness,
                self.loudness,
            ]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Pitch class, ignoring out-of-range values
    #[must_use]
    pub fn pitch_class(&self) -> Option<u8> {
        self.key.filter(|k| *k < 12)
    }

    #[must_use]
    pub fn camelot(&self) -> Option<CamelotKey> {
        key::to_wheel_position(self.pitch_class(), self.mode)
    }
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            key: None,
            mode: None,
            energy: 0.5,
            danceability: 0.5,
            valence: 0.5,
            acousticness: 0.5,
            instrumentalness: 0.5,
            speechiness: 0.5,
            loudness: -10.0,
        }
    }
}

/// One candidate or queued song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque catalog id
    pub id: String,
    pub title: String,
    /// One or more artist names, primary artist first
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// `None` when the features could not be fetched or were malformed
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Option<AudioFeatures>,
    /// Catalog popularity, 0-100
    #[serde(default, deserialize_with = "clamped_popularity")]
    pub popularity: u8,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    /// Create a track with identity only; everything else empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: vec![artist.into()],
            album: None,
            genres: Vec::new(),
            features: None,
            popularity: 0,
            release_year: None,
            explicit: false,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn with_features(mut self, features: AudioFeatures) -> Self {
        self.features = Some(features);
        self
    }

    #[must_use]
    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = popularity.min(100);
        self
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Audio features, if present and usable.
    #[must_use]
    pub fn audio_features(&self) -> Option<&AudioFeatures> {
        self.features.as_ref().filter(|f| f.is_usable())
    }

    /// Wheel position from key and mode; `None` if either is missing.
    #[must_use]
    pub fn camelot(&self) -> Option<CamelotKey> {
        self.audio_features().and_then(AudioFeatures::camelot)
    }

    /// Display label such as `"8A"`
    #[must_use]
    pub fn camelot_label(&self) -> Option<String> {
        self.camelot().map(|k| k.to_string())
    }

    #[must_use]
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Lowercased title, artists and album joined for text matching
    #[must_use]
    pub fn search_text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.artists.iter().map(String::as_str))
            .chain(self.album.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

fn lenient_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let key = Option::<i64>::deserialize(deserializer)?;
    Ok(key.and_then(|k| u8::try_from(k).ok()).filter(|k| *k < 12))
}

fn lenient_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Mode>, D::Error> {
    let mode = Option::<i64>::deserialize(deserializer)?;
    Ok(mode
        .and_then(|m| u8::try_from(m).ok())
        .and_then(|m| Mode::try_from(m).ok()))
}

/// A feature set that does not parse is treated as never fetched.
fn lenient_features<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AudioFeatures>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Parsed(AudioFeatures),
        #[allow(dead_code)]
        Malformed(IgnoredAny),
    }

    match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Parsed(features)) => Ok(Some(features)),
        Some(Lenient::Malformed(_)) => {
            log::debug!("Malformed audio features treated as absent");
            Ok(None)
        }
        None => Ok(None),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamped_popularity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let popularity = i64::deserialize(deserializer)?;
    Ok(popularity.clamp(0, 100) as u8)
}

impl AsRef<Track> for Track {
    fn as_ref(&self) -> &Track {
        self
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artists.join(", "), self.title)
    }
}

/// Mean feature vector over a set of tracks.
///
/// Only tracks with usable features contribute. Key and mode average over the
/// tracks that have them and are `None` when none do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fingerprint {
    pub tempo: f64,
    pub key: Option<u8>,
    pub mode: Option<Mode>,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub loudness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    /// Number of tracks that contributed
    pub sample_size: usize,
}

impl Fingerprint {
    /// Aggregate the tracks that carry usable features.
    ///
    /// Returns `None` when no track contributes, so callers must handle the
    /// "no seed tracks" case before scoring.
    pub fn from_tracks<'a, I>(tracks: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let features: Vec<&AudioFeatures> = tracks
            .into_iter()
            .filter_map(Track::audio_features)
            .collect();

        if features.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = |field: fn(&AudioFeatures) -> f64| {
            features.iter().map(|f| field(f)).sum::<f64>() / features.len() as f64
        };

        let keys: Vec<f64> = features
            .iter()
            .filter_map(|f| f.pitch_class())
            .map(f64::from)
            .collect();
        let modes: Vec<f64> = features
            .iter()
            .filter_map(|f| f.mode)
            .map(Mode::as_f64)
            .collect();

        let key = mean_of(&keys).map(|k| k.round().clamp(0.0, 11.0) as u8);
        let mode = mean_of(&modes).map(|m| if m.round() >= 1.0 { Mode::Major } else { Mode::Minor });

        Some(Self {
            tempo: mean(|f| f.tempo),
            key,
            mode,
            energy: mean(|f| f.energy),
            danceability: mean(|f| f.danceability),
            valence: mean(|f| f.valence),
            loudness: mean(|f| f.loudness),
            acousticness: mean(|f| f.acousticness),
            instrumentalness: mean(|f| f.instrumentalness),
            speechiness: mean(|f| f.speechiness),
            sample_size: features.len(),
        })
    }

    #[must_use]
    pub fn camelot(&self) -> Option<CamelotKey> {
        key::to_wheel_position(self.key, self.mode)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
