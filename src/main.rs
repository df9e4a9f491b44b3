//! Blocklister - IPv4 blocklist fetcher and summarizer
//!
//! Keeps local snapshots of public blocklists current and prints them as
//! merged address ranges or CIDR blocks.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use blocklister::cli::{Cli, Commands};
use blocklister::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs go to stderr so `get` output can be piped
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run => blocklister::commands::run::run(&cli.config).await,
        Commands::Update { force } => blocklister::commands::update::run(force, &cli.config).await,
        Commands::Get { source, cidr } => {
            blocklister::commands::get::run(&source, cidr, &cli.config).await
        }
        Commands::Sources => blocklister::commands::sources::run(&cli.config).await,
        Commands::Config => {
            print!("{}", Config::generate_default_yaml());
            Ok(())
        }
        Commands::Version => {
            println!("blocklister {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
