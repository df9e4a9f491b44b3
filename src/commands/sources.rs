//! Sources command: registry and cache status.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::utils::{format_age, format_bytes, truncate};

/// List managed sources with their cache state
pub async fn run(config_path: &Path) -> Result<()> {
    let (config, service) = super::load_service(config_path)?;
    let now = Utc::now();

    println!();
    println!("Cache: {}", config.cache_dir.display());
    println!();
    println!("{:<22} {:<14} {:<10} {:<10} URL", "LIST", "FORMAT", "SIZE", "UPDATED");

    for (spec, (_, entry)) in service.sources().into_iter().zip(service.status()) {
        let (size, updated) = match entry.last_modified {
            Some(modified) => (format_bytes(entry.size), format_age(modified, now)),
            None => ("-".to_string(), "never".to_string()),
        };
        let url = service.fetcher(spec.id)?.url().to_string();
        println!(
            "{:<22} {:<14} {:<10} {:<10} {}",
            spec.id,
            spec.format.name(),
            size,
            updated,
            truncate(&url, 60)
        );
    }
    println!();

    Ok(())
}
