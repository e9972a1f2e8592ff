//! Harmonic flow: order a pool so it mixes smoothly out of an anchor track.
//!
//! Every candidate is classified against the anchor's key with
//! [`compatibility_tier`]. Candidates scoring at least 0.4 are sorted best
//! first and the anchor is placed at the front.
//!
//! The selector fails open. An anchor without a key, or a pool with no
//! compatible candidate, yields the pool exactly as given so the caller
//! always has something to show.

use crate::key::{compatibility_tier, Compatibility};
use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lowest tier score a candidate needs to be sequenced.
pub const MIN_FLOW_SCORE: f64 = 0.4;

/// A pool track with its optional relevance (e.g. crowd-match) score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub track: Track,
    #[serde(default)]
    pub relevance: Option<f64>,
}

impl PoolEntry {
    #[must_use]
    pub const fn new(track: Track, relevance: Option<f64>) -> Self {
        Self { track, relevance }
    }
}

impl From<Track> for PoolEntry {
    fn from(track: Track) -> Self {
        Self::new(track, None)
    }
}

/// A track in the flow output.
///
/// `compatibility` is `None` when the pool was returned unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    pub track: Track,
    pub relevance: Option<f64>,
    pub compatibility: Option<Compatibility>,
}

impl AsRef<Track> for FlowEntry {
    fn as_ref(&self) -> &Track {
        &self.track
    }
}

impl From<&PoolEntry> for FlowEntry {
    fn from(entry: &PoolEntry) -> Self {
        Self {
            track: entry.track.clone(),
            relevance: entry.relevance,
            compatibility: None,
        }
    }
}

/// Sequence `pool` starting from `anchor`.
///
/// # Examples
///
/// ```
/// use setlist::harmonic::{harmonic_flow, PoolEntry};
/// use setlist::track::Track;
///
/// // No key on the anchor: the pool comes back as given
/// let anchor = Track::new("a", "Anchor", "Artist");
/// let pool = vec![PoolEntry::from(Track::new("b", "Other", "Artist"))];
/// let flow = harmonic_flow(&anchor, &pool);
/// assert_eq!(flow.len(), 1);
/// assert!(flow[0].compatibility.is_none());
/// ```
#[must_use]
pub fn harmonic_flow(anchor: &Track, pool: &[PoolEntry]) -> Vec<FlowEntry> {
    let Some(anchor_key) = anchor.camelot() else {
        log::debug!("Anchor `{}' has no key; harmonic flow inactive", anchor.id);
        return unchanged(pool);
    };

    let mut candidates: Vec<(usize, &PoolEntry, Compatibility)> = pool
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.track.id != anchor.id)
        .map(|(index, entry)| (index, entry, compatibility_tier(Some(anchor_key), entry.track.camelot())))
        .filter(|(_, _, compat)| compat.score >= MIN_FLOW_SCORE)
        .collect();

    if candidates.is_empty() {
        log::debug!("No candidate mixes with {anchor_key}; returning pool unchanged");
        return unchanged(pool);
    }

    candidates.sort_by(|(ia, a, ca), (ib, b, cb)| {
        cb.score
            .total_cmp(&ca.score)
            .then_with(|| compare_relevance(b.relevance, a.relevance))
            .then_with(|| ia.cmp(ib))
    });

    log::debug!("Harmonic flow from {anchor_key}: {} of {} candidates", candidates.len(), pool.len());

    std::iter::once(FlowEntry {
        track: anchor.clone(),
        relevance: None,
        compatibility: Some(Compatibility::PERFECT),
    })
    .chain(candidates.into_iter().map(|(_, entry, compat)| FlowEntry {
        track: entry.track.clone(),
        relevance: entry.relevance,
        compatibility: Some(compat),
    }))
    .collect()
}

/// Present relevance beats absent; NaN sorts as absent.
fn compare_relevance(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| v.is_finite());
    let b = b.filter(|v| v.is_finite());
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn unchanged(pool: &[PoolEntry]) -> Vec<FlowEntry> {
    pool.iter().map(FlowEntry::from).collect()
}
