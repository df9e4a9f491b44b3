//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blocklister")]
#[command(author, version, about = "IPv4 blocklist fetcher and summarizer")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults are used if it does not exist)
    #[arg(short, long, default_value = "/etc/blocklister/config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Keep every configured list fresh until SIGINT/SIGTERM
    Run,

    /// Refresh stale lists once
    Update {
        /// Refetch every list regardless of age
        #[arg(long)]
        force: bool,
    },

    /// Print the summarized ranges of one list
    Get {
        /// List identifier (see `blocklister sources`)
        source: String,

        /// Print CIDR blocks instead of address ranges
        #[arg(long)]
        cidr: bool,
    },

    /// List the supported lists and their cache state
    Sources,

    /// Print the default configuration
    Config,

    /// Show version
    Version,
}
