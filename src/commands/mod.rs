//! CLI command implementations.

pub mod get;
pub mod run;
pub mod sources;
pub mod update;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::service::Blocklister;

/// Load the config (or defaults) and build the service.
pub(crate) fn load_service(config_path: &Path) -> Result<(Config, Blocklister)> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let service = Blocklister::new(&config)?;
    Ok((config, service))
}
