//! Command-line interface for eztrack.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// eztrack - keeps a local TV library in step with EZTV
#[derive(Parser)]
#[command(name = "eztrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print less output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show what would be downloaded without touching Transmission or the config
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tracked shows
    #[command(alias = "ls")]
    List {
        /// Also list every show on the remote catalog
        #[arg(short, long)]
        all: bool,
    },

    /// Show a show's episodes and local status
    #[command(alias = "s")]
    Show {
        /// Show title, URL or title pattern
        pattern: String,

        /// Track the show and download what is missing
        #[arg(short, long)]
        update: bool,

        /// Consider episodes older than the newest downloaded one
        #[arg(short, long)]
        all: bool,
    },

    /// Track a show and download what is missing
    #[command(alias = "u")]
    Update {
        /// Show title, URL or title pattern
        pattern: String,

        /// Consider episodes older than the newest downloaded one
        #[arg(short, long)]
        all: bool,
    },

    /// Update every tracked show
    UpdateAll {
        /// Consider episodes older than the newest downloaded one
        #[arg(short, long)]
        all: bool,
    },

    /// List the latest releases, optionally filtered
    Latest {
        /// Number of latest releases to list
        #[arg(short, default_value_t = 20)]
        n: usize,

        /// Title regex to search for
        #[arg(long)]
        title: Option<String>,

        /// Only this season
        #[arg(long)]
        season: Option<i32>,

        /// Only this episode
        #[arg(long)]
        episode: Option<i32>,

        /// Number of matching releases to find when filtering
        #[arg(short, default_value_t = 1)]
        m: usize,

        /// Print every field of each release
        #[arg(short)]
        long: bool,
    },

    /// Download one episode by its index in the show listing
    Grab {
        /// Show title, URL or title pattern
        pattern: String,

        /// Zero-based index into the sorted episode listing
        index: usize,
    },

    /// Create default config file
    Init,
}

/// What every command handler receives.
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub quiet: bool,
    pub dry_run: bool,
}

pub use commands::*;
