//! Run command: the long-lived updater.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::signal::{listen_for_signals, ShutdownToken};

/// Run the updater loop until SIGINT or SIGTERM
pub async fn run(config_path: &Path) -> Result<()> {
    let (config, service) = super::load_service(config_path)?;
    info!(
        "Managing {} lists in {:?}",
        service.sources().len(),
        config.cache_dir
    );

    let shutdown = ShutdownToken::new();
    let signals = listen_for_signals(shutdown.clone());

    let updater = Arc::new(service.updater());
    updater.spawn(shutdown.clone()).await?;

    signals.abort();
    Ok(())
}
