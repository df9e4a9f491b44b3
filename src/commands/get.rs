//! Get command: print one summarized list.

use anyhow::Result;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::BlocklisterError;
use crate::service::supported_sources;

/// Print the summarized ranges of `source`, one per line
pub async fn run(source: &str, cidr: bool, config_path: &Path) -> Result<()> {
    let (_, service) = super::load_service(config_path)?;

    let entries = match service.get_ranges_checked(source, cidr).await {
        Ok(entries) => entries,
        Err(e @ BlocklisterError::UnknownSource(_)) => {
            eprintln!("Supported lists: {}", supported_sources().join(", "));
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for entry in entries {
        writeln!(out, "{}", entry)?;
    }
    out.flush()?;
    Ok(())
}
