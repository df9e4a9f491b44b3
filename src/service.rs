//! Public facade: look up a source, keep it fresh, and serve its ranges.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use tracing::{debug, info, warn};

use crate::aggregator::{
    count_addresses, coverage_percent, deduplicate, range_to_cidrs, summarize,
};
use crate::config::Config;
use crate::error::{BlocklisterError, Result};
use crate::fetcher::{build_client, CacheEntry, Fetcher};
use crate::parser::parse_file;
use crate::sources::{self, LineFormat, SourceSpec};
use crate::updater::Updater;
use crate::utils::format_count;

/// Owns one [`Fetcher`] per managed source.
#[derive(Debug)]
pub struct Blocklister {
    fetchers: Vec<Arc<Fetcher>>,
    update_interval: Duration,
}

impl Blocklister {
    /// Build fetchers for every source selected by `config`.
    pub fn new(config: &Config) -> AnyResult<Self> {
        config.validate()?;
        let client = build_client().context("Failed to build HTTP client")?;

        let fetchers = config
            .selected_sources()
            .into_iter()
            .map(|spec| {
                let id = spec.id;
                let mut fetcher = Fetcher::new(spec, &config.cache_dir, client.clone());
                if let Some(mirror) = config.mirror_for(id) {
                    debug!("Using mirror {} for {}", mirror, id);
                    fetcher = fetcher.with_url(mirror);
                }
                Arc::new(fetcher)
            })
            .collect();

        Ok(Self::from_fetchers(fetchers, config.update_interval()))
    }

    pub fn from_fetchers(fetchers: Vec<Arc<Fetcher>>, update_interval: Duration) -> Self {
        Self {
            fetchers,
            update_interval,
        }
    }

    /// Managed source specs in registry order.
    pub fn sources(&self) -> Vec<&SourceSpec> {
        self.fetchers.iter().map(|f| f.spec()).collect()
    }

    /// Find the fetcher of a managed source (case-insensitive).
    pub fn fetcher(&self, id: &str) -> Result<&Arc<Fetcher>> {
        let id = id.trim();
        self.fetchers
            .iter()
            .find(|f| f.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| BlocklisterError::UnknownSource(id.to_string()))
    }

    /// Fetch the source if its cache is stale and report the cache state.
    pub async fn ensure_fresh(&self, id: &str) -> Result<CacheEntry> {
        let fetcher = self.fetcher(id)?;
        fetcher.ensure_fresh().await?;
        Ok(fetcher.cache_entry())
    }

    /// Summarized ranges of one source, as `A.B.C.D[-E.F.G.H]` or CIDR strings.
    ///
    /// A failed refresh falls back to the previous snapshot when one exists.
    /// An empty vector means the snapshot held no matching line.
    pub async fn get_ranges(&self, id: &str, as_cidr: bool) -> Result<Vec<String>> {
        let fetcher = self.fetcher(id)?;

        if let Err(e) = fetcher.ensure_fresh().await {
            let entry = fetcher.cache_entry();
            if !entry.is_usable() {
                warn!("Cannot deliver {}: {}", fetcher.id(), e);
                return Err(BlocklisterError::CacheUnavailable {
                    source_id: fetcher.id().to_string(),
                    path: entry.path,
                });
            }
            warn!("Refresh of {} failed, serving stale copy: {}", fetcher.id(), e);
        }

        read_summarized(fetcher.id(), fetcher.spec().format, fetcher.cache_path(), as_cidr)
    }

    /// Like [`get_ranges`](Self::get_ranges), but an empty result is an error.
    pub async fn get_ranges_checked(&self, id: &str, as_cidr: bool) -> Result<Vec<String>> {
        let ranges = self.get_ranges(id, as_cidr).await?;
        if ranges.is_empty() {
            return Err(BlocklisterError::EmptyResult(self.fetcher(id)?.id().to_string()));
        }
        Ok(ranges)
    }

    /// Cache state of every managed source.
    pub fn status(&self) -> Vec<(&'static str, CacheEntry)> {
        self.fetchers
            .iter()
            .map(|f| (f.id(), f.cache_entry()))
            .collect()
    }

    /// Background updater over the same fetchers.
    pub fn updater(&self) -> Updater {
        Updater::new(self.fetchers.clone(), self.update_interval)
    }
}

/// Parse a cache file and render its summarized contents.
pub fn read_summarized(
    id: &str,
    format: LineFormat,
    path: &Path,
    as_cidr: bool,
) -> Result<Vec<String>> {
    let mut lines = parse_file(format, path)?;
    let (ranges, duplicates) = deduplicate(lines.by_ref());
    let stats = lines.stats();

    if duplicates > 0 {
        debug!("{}: {} duplicate entries removed", id, duplicates);
    }
    if stats.dropped > 0 {
        warn!("{}: {} malformed lines dropped", id, stats.dropped);
    }

    let merged = summarize(ranges);
    let addresses = count_addresses(&merged);
    info!(
        "{}: {} lines, {} ranges, {} after summarize ({} addresses, {:.4}% of IPv4)",
        id,
        format_count(stats.lines),
        format_count(stats.ranges),
        format_count(merged.len()),
        addresses,
        coverage_percent(addresses)
    );

    let rendered = if as_cidr {
        merged
            .into_iter()
            .flat_map(range_to_cidrs)
            .map(|net| net.to_string())
            .collect()
    } else {
        merged.iter().map(ToString::to_string).collect()
    };
    Ok(rendered)
}

/// Registry ids, for error messages listing what is supported.
pub fn supported_sources() -> Vec<&'static str> {
    sources::source_ids()
}
