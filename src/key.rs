//! # Key Theory Module
//!
//! Maps raw `(pitch class, mode)` pairs onto the 24-position Camelot wheel and
//! classifies how well two keys mix.
//!
//! The wheel has 12 rotational positions and two polarities:
//! - `A`: minor keys (outer ring)
//! - `B`: major keys (inner ring)
//!
//! Moving one step clockwise on the same ring lifts the energy of a set,
//! one step counter-clockwise relaxes it. Switching rings at the same number
//! is the relative major/minor.
//!
//! ## Examples
//!
//! ```
//! use setlist::key::{compatibility_tier, CamelotKey, Tier};
//!
//! let anchor: CamelotKey = "8A".parse().unwrap();
//! let next: CamelotKey = "9A".parse().unwrap();
//!
//! let result = compatibility_tier(Some(anchor), Some(next));
//! assert_eq!(result.tier, Tier::EnergyBoost);
//! assert_eq!(result.score, 0.80);
//! ```

use crate::track::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wheel numbers for major keys, indexed by pitch class (0=C, 1=C#, ..., 11=B).
///
/// Pitch class 0 (C major) sits at position 8. The table is the stored-label
/// mapping and must not be replaced with a derived formula. It follows the
/// standard wheel (G major is 9B, not 8A); label-level pairings such as
/// 8A->9A boost, 8A->7A drop and 8A->8B relative hold for any table.
const MAJOR_WHEEL: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Wheel numbers for minor keys, indexed by pitch class.
const MINOR_WHEEL: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Number of rotational positions on the wheel.
const WHEEL_SIZE: u8 = 12;

/// Ring of the wheel a key sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Minor keys
    A,
    /// Major keys
    B,
}

impl Polarity {
    #[must_use]
    pub const fn from_mode(mode: Mode) -> Self {
        match mode {
            Mode::Minor => Self::A,
            Mode::Major => Self::B,
        }
    }

    #[must_use]
    pub const fn mode(self) -> Mode {
        match self {
            Self::A => Mode::Minor,
            Self::B => Mode::Major,
        }
    }

    const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

/// A position on the Camelot wheel, e.g. `8A`.
///
/// Always valid: the number is in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotKey {
    number: u8,
    polarity: Polarity,
}

impl CamelotKey {
    /// Create a key from a wheel number (1-12) and polarity.
    ///
    /// Returns `None` when the number is off the wheel.
    #[must_use]
    pub const fn new(number: u8, polarity: Polarity) -> Option<Self> {
        if number >= 1 && number <= WHEEL_SIZE {
            Some(Self { number, polarity })
        } else {
            None
        }
    }

    /// Parse a label such as `"8A"`, `"12b"` or `" 3B "`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let letter = label.chars().last()?;
        let polarity = match letter.to_ascii_uppercase() {
            'A' => Polarity::A,
            'B' => Polarity::B,
            _ => return None,
        };
        let number = label[..label.len() - letter.len_utf8()].parse::<u8>().ok()?;
        Self::new(number, polarity)
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        self.number
    }

    #[must_use]
    pub const fn polarity(self) -> Polarity {
        self.polarity
    }

    /// Pitch class of the key's root (0=C, ..., 11=B)
    #[must_use]
    pub fn pitch_class(self) -> u8 {
        let table = match self.polarity {
            Polarity::A => &MINOR_WHEEL,
            Polarity::B => &MAJOR_WHEEL,
        };
        // Each table is a permutation of 1..=12, so the lookup always succeeds.
        table
            .iter()
            .position(|&n| n == self.number)
            .map_or(0, |pc| pc as u8)
    }

    /// Musical notation for the key, e.g. `"Am"` for 8A and `"C"` for 8B
    #[must_use]
    pub fn key_name(self) -> String {
        let note = NOTE_NAMES[usize::from(self.pitch_class())];
        match self.polarity {
            Polarity::A => format!("{note}m"),
            Polarity::B => note.to_string(),
        }
    }

    /// Whether `other` is exactly one step clockwise from `self`.
    #[must_use]
    pub const fn is_clockwise_step_to(self, other: Self) -> bool {
        (other.number + WHEEL_SIZE - self.number) % WHEEL_SIZE == 1
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.polarity.letter())
    }
}

/// Error returned when a string is not a Camelot label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Camelot key `{0}' (expected 1A-12A or 1B-12B)")]
pub struct ParseCamelotError(String);

impl FromStr for CamelotKey {
    type Err = ParseCamelotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseCamelotError(s.to_string()))
    }
}

impl Serialize for CamelotKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CamelotKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Discrete compatibility classification between two keys.
///
/// Variants are ordered from best to worst mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Perfect,
    Relative,
    EnergyBoost,
    EnergyDrop,
    Adjacent,
    Compatible,
    Distant,
}

impl Tier {
    /// Human-readable label for display next to a track
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect match",
            Self::Relative => "Relative key",
            Self::EnergyBoost => "Energy boost",
            Self::EnergyDrop => "Energy drop",
            Self::Adjacent => "Adjacent key",
            Self::Compatible => "Compatible",
            Self::Distant => "Distant key",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score and tier for a key comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compatibility {
    pub score: f64,
    pub tier: Tier,
}

impl Compatibility {
    pub const PERFECT: Self = Self { score: 1.00, tier: Tier::Perfect };
    pub const DISTANT: Self = Self { score: 0.20, tier: Tier::Distant };
}

/// Map a pitch class and mode to a wheel position.
///
/// Returns `None` ("unknown") when either input is missing or the pitch class
/// is outside 0-11.
#[must_use]
pub fn to_wheel_position(pitch_class: Option<u8>, mode: Option<Mode>) -> Option<CamelotKey> {
    let pitch_class = usize::from(pitch_class?);
    let mode = mode?;
    let number = match mode {
        Mode::Major => *MAJOR_WHEEL.get(pitch_class)?,
        Mode::Minor => *MINOR_WHEEL.get(pitch_class)?,
    };
    CamelotKey::new(number, Polarity::from_mode(mode))
}

/// Shortest rotational distance between two wheel numbers (0-6).
#[must_use]
pub const fn circular_distance(a: u8, b: u8) -> u8 {
    let a = a % WHEEL_SIZE;
    let b = b % WHEEL_SIZE;
    let clockwise = (b + WHEEL_SIZE - a) % WHEEL_SIZE;
    let counter = (a + WHEEL_SIZE - b) % WHEEL_SIZE;
    if clockwise < counter {
        clockwise
    } else {
        counter
    }
}

/// Classify how `b` mixes after `a`.
///
/// Not symmetric: one clockwise step is an energy boost, the reverse
/// direction an energy drop. Unknown keys are always [`Tier::Distant`].
#[must_use]
pub fn compatibility_tier(a: Option<CamelotKey>, b: Option<CamelotKey>) -> Compatibility {
    let (Some(a), Some(b)) = (a, b) else {
        return Compatibility::DISTANT;
    };

    let same_polarity = a.polarity == b.polarity;
    let (score, tier) = match (circular_distance(a.number, b.number), same_polarity) {
        (0, true) => (1.00, Tier::Perfect),
        (0, false) => (0.90, Tier::Relative),
        (1, true) if a.is_clockwise_step_to(b) => (0.80, Tier::EnergyBoost),
        (1, true) => (0.80, Tier::EnergyDrop),
        (1, false) => (0.65, Tier::Adjacent),
        (2, true) => (0.50, Tier::Compatible),
        (2, false) => (0.40, Tier::Compatible),
        _ => return Compatibility::DISTANT,
    };

    Compatibility { score, tier }
}
