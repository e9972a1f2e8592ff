//! Track compatibility and curation engine for live event DJs.
//!
//! Core modules:
//! - [`track`] - Track, audio features and queue fingerprints
//! - [`key`] - Camelot wheel mapping and key compatibility tiers
//! - [`synergy`] - Track-to-fingerprint synergy scoring
//! - [`discovery`] - Hidden-gem ranking against the queue and event theme
//! - [`filter`] - Smart filter pipeline (content, cooldown, era, mood, vocals)
//! - [`harmonic`] - Harmonic flow sequencing from an anchor track
//!
//! ### Supporting Modules
//!
//! - [`config`] - Settings file loading and platform config directory
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! Every engine operation is a pure function of its arguments: no I/O, no
//! shared state, nothing persisted between calls. Fetching tracks and audio
//! features from the catalog is the caller's job; [`discovery::select_seeds`]
//! and [`discovery::feature_batches`] help shape those requests.
//!
//! ## Quick Start Example
//!
//! ```
//! use setlist::discovery::{discover, EventTheme};
//! use setlist::filter::{self, FilterContext, SmartFilterConfig};
//! use setlist::harmonic::{harmonic_flow, PoolEntry};
//! use setlist::track::{AudioFeatures, Mode, Track};
//!
//! let features = |tempo: f64, key: u8| AudioFeatures {
//!     tempo,
//!     key: Some(key),
//!     mode: Some(Mode::Minor),
//!     ..AudioFeatures::default()
//! };
//!
//! let queue = vec![Track::new("q1", "Warmup", "Resident").with_features(features(122.0, 9))];
//! let pool = vec![
//!     Track::new("c1", "Deep Cut", "Newcomer")
//!         .with_features(features(124.0, 4))
//!         .with_popularity(35),
//! ];
//!
//! // Hidden gems for the queue's overall vibe
//! let theme = EventTheme { name: "Warehouse Night".into(), ..EventTheme::default() };
//! let gems = discover(&queue, &pool, &theme);
//! assert_eq!(gems.len(), 1);
//!
//! // Smart filters before display
//! let shown = filter::apply(gems, &SmartFilterConfig::default(), &FilterContext::new(&queue, 2024));
//! assert_eq!(shown.len(), 1);
//!
//! // What mixes out of the current track (Am = 8A, Em = 9A)
//! let entries: Vec<PoolEntry> = pool.into_iter().map(PoolEntry::from).collect();
//! let flow = harmonic_flow(&queue[0], &entries);
//! assert_eq!(flow[0].track.id, "q1");
//! assert_eq!(flow[1].compatibility.unwrap().score, 0.80);
//! ```
//!
//! ## Error Handling
//!
//! The engine has no error paths. Missing or degenerate data degrades
//! silently: tracks without features are left out of fingerprints and
//! rankings, keyless tracks are harmonically neutral, and the harmonic flow
//! falls back to the pool as given. File and parse errors in [`config`] and
//! the binary use `anyhow::Result`.
//!
//! ## Logging
//!
//! Pipeline decisions are logged through the `log` facade at `debug` and
//! `trace` level; the binary wires it to `env_logger` (`RUST_LOG=setlist=debug`).

pub mod cli;
pub mod completion;
pub mod config;
pub mod discovery;
pub mod filter;
pub mod harmonic;
pub mod key;
pub mod synergy;
pub mod track;
