//! # Setlist - Track Compatibility & Curation Engine
//!
//! Command-line harness over the engine. Tracks, pools and event metadata are
//! read from JSON files produced by the catalog and event collaborators; the
//! engine itself never touches the network or disk.
//!
//! ## Usage
//!
//! ```bash
//! # Hidden gems for the current queue
//! setlist discover --queue queue.json --pool pool.json --event event.json
//!
//! # What mixes out of the playing track
//! setlist flow --anchor <track-id> --pool pool.json --queue queue.json
//!
//! # Apply the smart filters from the settings file
//! setlist filter --tracks recs.json --queue queue.json
//!
//! # Inspect a key pairing
//! setlist compat 8A 9A
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use setlist::cli::{self, OutputOpts};
use setlist::config::Settings;
use setlist::discovery::{self, EventTheme};
use setlist::filter::{self, FilterContext, SmartFilterConfig};
use setlist::harmonic::{self, FlowEntry, PoolEntry};
use setlist::key::{self, CamelotKey};
use setlist::track::Track;
use setlist::completion;
use std::fs;
use std::path::Path;

/// Pool file items: bare tracks or tracks with a relevance score
#[derive(Deserialize)]
#[serde(untagged)]
enum PoolItem {
    Entry(PoolEntry),
    Track(Track),
}

impl From<PoolItem> for PoolEntry {
    fn from(item: PoolItem) -> Self {
        match item {
            PoolItem::Entry(entry) => entry,
            PoolItem::Track(track) => PoolEntry::from(track),
        }
    }
}

/// Read and parse a JSON input file
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_optional<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    path.map_or_else(|| Ok(T::default()), read_json)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

fn key_column(track: &Track) -> String {
    track.camelot_label().unwrap_or_else(|| "--".to_string())
}

/// Main entry point for setlist.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug setlist discover ...` - Enable debug logging
/// - `RUST_LOG=setlist::synergy=trace setlist discover ...` - Per-track scores
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Discover { queue, pool, event, output } => {
            let settings = Settings::resolve(args.settings.as_deref())?;
            let queue: Vec<Track> = read_json(&queue)?;
            let pool: Vec<Track> = read_json(&pool)?;
            let theme: EventTheme = read_optional(event.as_deref())?;

            info!("Discovering from {} candidates for a queue of {}", pool.len(), queue.len());
            let gems = discovery::discover_with(&queue, &pool, &theme, &settings.discovery);
            let gems = apply_filters(gems, &settings.filters, &queue, output);

            if output.json {
                print_json(&gems)?;
            } else if gems.is_empty() {
                println!("No hidden gems found");
            } else {
                for (i, gem) in gems.iter().enumerate() {
                    println!(
                        "{:>2}. {} [{}] synergy {} theme {} pop {} - {}",
                        i + 1,
                        gem.track,
                        key_column(&gem.track),
                        gem.synergy,
                        gem.theme_match,
                        gem.track.popularity,
                        gem.rationale
                    );
                }
            }
        }
        cli::Command::Flow { anchor, pool, queue, output } => {
            let settings = Settings::resolve(args.settings.as_deref())?;
            let queue: Vec<Track> = read_optional(queue.as_deref())?;
            let items: Vec<PoolItem> = read_json(&pool)?;
            let pool: Vec<PoolEntry> = items.into_iter().map(PoolEntry::from).collect();

            let anchor_track = pool
                .iter()
                .map(|e| &e.track)
                .chain(queue.iter())
                .find(|t| t.id == anchor)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Anchor track `{anchor}' not found in pool or queue"))?;

            info!("Harmonic flow from {anchor_track} over {} candidates", pool.len());
            let flow = harmonic::harmonic_flow(&anchor_track, &pool);
            let flow = filter_flow(flow, &settings.filters, &queue, output);
            print_flow(&flow, output.json)?;
        }
        cli::Command::Filter { tracks, queue, json } => {
            let settings = Settings::resolve(args.settings.as_deref())?;
            let tracks: Vec<Track> = read_json(&tracks)?;
            let queue: Vec<Track> = read_optional(queue.as_deref())?;

            let ctx = FilterContext::now(&queue);
            let (kept, report) = filter::apply_with_report(tracks, &settings.filters, &ctx);

            if json {
                print_json(&kept)?;
            } else {
                for (stage, removed) in &report.removed {
                    println!("{stage}: removed {removed}");
                }
                println!("Kept {}/{} tracks", report.output, report.input);
                for track in &kept {
                    println!("  {} [{}]", track, key_column(track));
                }
            }
        }
        cli::Command::Compat { from, to } => {
            let from: CamelotKey = from.parse()?;
            let to: CamelotKey = to.parse()?;
            let result = key::compatibility_tier(Some(from), Some(to));
            println!(
                "{} ({}) -> {} ({}): {} [{:.2}]",
                from,
                from.key_name(),
                to,
                to.key_name(),
                result.tier,
                result.score
            );
        }
        cli::Command::Seeds { queue } => {
            let queue: Vec<Track> = read_json(&queue)?;
            let seeds = discovery::select_seeds(&queue);
            print_json(&seeds)?;
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(())
}

/// Apply the settings' smart filters unless disabled on the command line
fn apply_filters<T: AsRef<Track>>(
    items: Vec<T>,
    filters: &SmartFilterConfig,
    queue: &[Track],
    output: OutputOpts,
) -> Vec<T> {
    if output.no_filters {
        debug!("Smart filters skipped");
        return items;
    }
    filter::apply(items, filters, &FilterContext::now(queue))
}

/// Filter the candidates of a sequenced flow.
///
/// The anchor stays in front and vocal focus is not applied, so the tier
/// order survives. A flow that fell back to the plain pool is filtered whole.
fn filter_flow(flow: Vec<FlowEntry>, filters: &SmartFilterConfig, queue: &[Track], output: OutputOpts) -> Vec<FlowEntry> {
    if !flow.first().is_some_and(|entry| entry.compatibility.is_some()) {
        return apply_filters(flow, filters, queue, output);
    }

    let candidate_filters = SmartFilterConfig {
        vocal_focus: false,
        ..filters.clone()
    };
    let mut entries = flow.into_iter();
    let anchor = entries.next();
    let candidates = apply_filters(entries.collect(), &candidate_filters, queue, output);
    anchor.into_iter().chain(candidates).collect()
}

fn print_flow(flow: &[FlowEntry], json: bool) -> Result<()> {
    if json {
        return print_json(flow);
    }
    for (i, entry) in flow.iter().enumerate() {
        let tier = entry
            .compatibility
            .map_or_else(String::new, |c| format!(" {} ({:.2})", c.tier, c.score));
        println!("{:>2}. {} [{}]{}", i + 1, entry.track, key_column(&entry.track), tier);
    }
    Ok(())
}
