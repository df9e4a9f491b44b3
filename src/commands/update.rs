//! Update command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::{error, info};

/// Refresh stale lists once, or every list with `force`
pub async fn run(force: bool, config_path: &Path) -> Result<()> {
    let (_, service) = super::load_service(config_path)?;
    let updater = service.updater();

    info!("Updating blocklists...");
    let report = if force {
        updater.force_update().await
    } else {
        updater.run_once().await
    };

    for (id, reason) in &report.failed {
        error!("{}: {}", id, reason);
    }
    info!(
        "{} refreshed, {} up to date, {} failed",
        report.refreshed.len(),
        report.fresh.len(),
        report.failed.len()
    );

    if !report.is_success() {
        anyhow::bail!("{} list(s) failed to update", report.failed.len());
    }
    Ok(())
}
