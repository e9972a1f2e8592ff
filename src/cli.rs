//! # Command-Line Interface Module
//!
//! Defines the `setlist` command line using Clap derive macros. The binary is
//! a thin harness over the engine: it reads tracks and event metadata from
//! JSON files, runs one engine operation and prints the result.
//!
//! ## Commands
//!
//! - `discover`: Rank hidden gems for a queue from a candidate pool
//! - `flow`: Sequence a pool harmonically out of an anchor track
//! - `filter`: Apply the smart filters to a track list
//! - `compat`: Show the compatibility tier between two Camelot keys
//! - `seeds`: Pick seed tracks and genres for a recommendation request
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! setlist discover --queue queue.json --pool pool.json --event event.json
//! setlist flow --anchor 4uLU6hMCjMI75M1A2tKUQC --pool pool.json --json
//! setlist compat 8A 9A
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "setlist")]
#[command(about = "Setlist: track compatibility & curation engine for live event DJs")]
#[command(version)]
pub struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SETLIST_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by commands that print track lists
#[derive(ClapArgs, Debug, Clone, Copy, Default)]
pub struct OutputOpts {
    /// Print JSON instead of a text listing
    #[arg(long)]
    pub json: bool,

    /// Skip the smart filters from the settings file
    #[arg(long)]
    pub no_filters: bool,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank hidden gems for the current queue
    ///
    /// Aggregates the queue into a fingerprint, scores every candidate in the
    /// pool for musical synergy and theme match, and keeps moderately popular
    /// tracks that fit. The smart filters are applied before printing.
    Discover {
        /// JSON array of queued tracks, in play order
        #[arg(long)]
        queue: PathBuf,

        /// JSON array of candidate tracks
        #[arg(long)]
        pool: PathBuf,

        /// JSON object with the event's name, theme and description
        #[arg(long)]
        event: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Sequence a pool harmonically starting from an anchor track
    ///
    /// Candidates are classified by Camelot key against the anchor and
    /// ordered best mix first. When nothing mixes, the pool is printed as
    /// given.
    Flow {
        /// Id of the anchor track (looked up in the pool, then the queue)
        #[arg(long)]
        anchor: String,

        /// JSON array of candidate tracks, or of {"track": ..., "relevance": ...}
        #[arg(long)]
        pool: PathBuf,

        /// JSON array of queued tracks, for the anchor lookup and cooldown
        #[arg(long)]
        queue: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Apply the smart filters to a track list
    Filter {
        /// JSON array of tracks to filter
        #[arg(long)]
        tracks: PathBuf,

        /// JSON array of queued tracks, for the repetition cooldown
        #[arg(long)]
        queue: Option<PathBuf>,

        /// Print JSON instead of a text listing
        #[arg(long)]
        json: bool,
    },

    /// Show how a track in one key mixes into another
    ///
    /// Keys are Camelot labels such as 8A or 12B.
    Compat {
        /// Key of the current track
        from: String,

        /// Key of the next track
        to: String,
    },

    /// Pick seed tracks and genres for a recommendation request
    Seeds {
        /// JSON array of queued tracks
        #[arg(long)]
        queue: PathBuf,
    },

    /// Generate shell completions
    ///
    /// Usage: setlist completion bash > ~/.local/share/bash-completion/completions/setlist
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
