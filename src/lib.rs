//! # Blocklister - IPv4 blocklist fetcher and summarizer
//!
//! Downloads public IPv4 blocklists, keeps one raw snapshot per list on disk,
//! and serves each list as the minimal set of merged address ranges or CIDR
//! blocks.
//!
//! ## Features
//!
//! - **Static registry** - iblocklist, Spamhaus DROP/EDROP, blocklist.de
//! - **Four line formats** - bare address, dash range, CIDR with comment, `label:A-B`
//! - **Endpoint-only merging** - a `/8` costs the same as a single address
//! - **Minimal CIDR split** - exact cover, no gaps, no overlap
//! - **Stale-tolerant** - a failed download keeps serving the previous snapshot
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Blocklister                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: run, update, get, sources, config          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Service facade                                             │
//! │    ├── get_ranges / ensure_fresh                            │
//! │    └── Updater (tokio interval, shutdown token)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls, flate2)                         │
//! │    └── one cache file per source, atomic replace            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Parser (regex)  ──►  Aggregator (ipnet)                    │
//! │    └── LineFormat tag     └── merge runs, split to CIDR     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use blocklister::config::Config;
//! use blocklister::service::Blocklister;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("/etc/blocklister/config.yaml")?;
//!     let service = Blocklister::new(&config)?;
//!
//!     for cidr in service.get_ranges("spamhausdrop", true).await? {
//!         println!("{}", cidr);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - Contiguous-run merging and CIDR decomposition
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error types
//! - [`fetcher`] - HTTP download and cache file management
//! - [`parser`] - Line parsing of raw feed text
//! - [`range`] - Inclusive IPv4 range type
//! - [`service`] - `get_ranges` / `ensure_fresh` facade
//! - [`signal`] - Graceful shutdown signal handling
//! - [`sources`] - Registry of supported lists
//! - [`updater`] - Periodic refresh loop
//! - [`utils`] - Common utility functions (formatting, truncation)

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod range;
pub mod service;
pub mod signal;
pub mod sources;
pub mod updater;
pub mod utils;

pub use error::{BlocklisterError, FetchError};
pub use range::Range;
pub use service::Blocklister;
pub use sources::{LineFormat, SourceSpec};
