//! HTTP fetcher owning the on-disk snapshot of one blocklist.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use flate2::read::MultiGzDecoder;
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::sources::SourceSpec;
use crate::utils::{format_bytes, format_count};

const TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 2000;

/// Maximum size of a decompressed list (32 MB).
/// The largest iblocklist archive (level1) is ~7 MB once unpacked.
const MAX_LIST_SIZE: usize = 32 * 1024 * 1024;

/// User-Agent header value for HTTP requests.
pub const USER_AGENT: &str = concat!("blocklister/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by every fetcher.
pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::ClientBuild)
}

/// State of a source's cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// `None` when the file does not exist.
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

impl CacheEntry {
    /// Read the entry from the file system.
    pub fn load(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) => Self {
                path: path.to_path_buf(),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                size: meta.len(),
            },
            Err(_) => Self {
                path: path.to_path_buf(),
                last_modified: None,
                size: 0,
            },
        }
    }

    pub fn exists(&self) -> bool {
        self.last_modified.is_some()
    }

    /// A usable snapshot: present and not empty.
    pub fn is_usable(&self) -> bool {
        self.exists() && self.size > 0
    }
}

/// Downloads one source and keeps its cache file current.
pub struct Fetcher {
    spec: SourceSpec,
    url: String,
    cache_path: PathBuf,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
    /// Serializes downloads of this source; readers never take it.
    download_lock: Mutex<()>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("id", &self.spec.id)
            .field("url", &self.url)
            .field("cache_path", &self.cache_path)
            .field("refresh_interval", &self.spec.refresh_interval)
            .finish()
    }
}

impl Fetcher {
    pub fn new(spec: SourceSpec, cache_dir: &Path, client: Client) -> Self {
        Self {
            url: spec.url.to_string(),
            cache_path: spec.cache_path(cache_dir),
            spec,
            client,
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            download_lock: Mutex::new(()),
        }
    }

    /// Fetch from a mirror instead of the registry URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Override retry count and base delay (doubled after each attempt).
    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn cache_entry(&self) -> CacheEntry {
        CacheEntry::load(&self.cache_path)
    }

    /// True if the cache file is absent, empty, or older than the refresh interval.
    pub fn is_stale(&self) -> bool {
        let meta = match fs::metadata(&self.cache_path) {
            Ok(meta) => meta,
            Err(_) => return true,
        };
        if meta.len() == 0 {
            return true;
        }
        match meta.modified() {
            Ok(mtime) => SystemTime::now()
                .duration_since(mtime)
                .map(|age| age > self.spec.refresh_interval)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Staleness check with first-touch bootstrap.
    ///
    /// If the cache file has never been written, an initial download is
    /// attempted before answering.
    pub async fn needs_update(&self) -> bool {
        if !self.cache_path.exists() {
            info!("Get initial file for {} from {}", self.spec.id, self.url);
            if let Err(e) = self.fetch().await {
                warn!("Initial fetch of {} failed: {}", self.spec.id, e);
            }
        }
        self.is_stale()
    }

    /// Download, decompress and atomically replace the cache file.
    ///
    /// Returns the decompressed text that was written.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let _guard = self.download_lock.lock().await;
        self.fetch_locked().await
    }

    /// Fetch only if stale. Concurrent callers wait for one download.
    ///
    /// Returns `true` if a download happened.
    pub async fn ensure_fresh(&self) -> Result<bool, FetchError> {
        if !self.is_stale() {
            return Ok(false);
        }
        let _guard = self.download_lock.lock().await;
        // Another caller may have refreshed it while we waited
        if !self.is_stale() {
            debug!("{} refreshed by a concurrent caller", self.spec.id);
            return Ok(false);
        }
        self.fetch_locked().await?;
        Ok(true)
    }

    async fn fetch_locked(&self) -> Result<String, FetchError> {
        info!("Fetching {}...", self.spec.id);

        let (body, final_url) = self.download_with_retry().await?;
        let gzipped = self.spec.compressed || is_gzip_url(&final_url);
        let bytes = if gzipped {
            decompress_gzip(&body, &self.url)?
        } else {
            body
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let path = self.cache_path.clone();
        let data = content.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, data.as_bytes()))
            .await
            .map_err(|e| FetchError::CacheWrite {
                path: self.cache_path.clone(),
                source: std::io::Error::other(e),
            })??;

        info!(
            "Fetched {} - {} lines ({})",
            self.spec.id,
            format_count(content.lines().count()),
            format_bytes(content.len() as u64)
        );
        Ok(content)
    }

    /// GET the source URL, retrying transport failures and 5xx responses.
    async fn download_with_retry(&self) -> Result<(Vec<u8>, String), FetchError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = self.retry_delay * (1 << (attempt - 1));
                debug!(
                    "Retry {} after {}ms for {}",
                    attempt,
                    delay.as_millis(),
                    self.url
                );
                tokio::time::sleep(delay).await;
            }

            match self.download_once().await {
                Ok(result) => return Ok(result),
                Err(e) if is_retryable(&e) => {
                    debug!("Attempt {} for {} failed: {}", attempt + 1, self.spec.id, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Timeout {
            url: self.url.clone(),
        }))
    }

    async fn download_once(&self) -> Result<(Vec<u8>, String), FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length as usize > MAX_LIST_SIZE {
                return Err(FetchError::TooLarge {
                    url: self.url.clone(),
                    size: content_length as usize,
                    max: MAX_LIST_SIZE,
                });
            }
        }

        let final_url = response.url().path().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        if body.len() > MAX_LIST_SIZE {
            return Err(FetchError::TooLarge {
                url: self.url.clone(),
                size: body.len(),
                max: MAX_LIST_SIZE,
            });
        }

        Ok((body.to_vec(), final_url))
    }
}

fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Network { .. } | FetchError::Timeout { .. } => true,
        FetchError::HttpStatus { status, .. } => StatusCode::from_u16(*status)
            .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
            .unwrap_or(false),
        _ => false,
    }
}

fn is_gzip_url(path: &str) -> bool {
    path.ends_with(".gz") || path.ends_with(".gzip")
}

/// Output buffer reserved up front, never more than [`MAX_LIST_SIZE`].
fn decompress_capacity(compressed_len: usize) -> usize {
    compressed_len.saturating_mul(4).min(MAX_LIST_SIZE)
}

/// Decode a gzip payload, refusing output larger than [`MAX_LIST_SIZE`].
pub fn decompress_gzip(data: &[u8], url: &str) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::with_capacity(decompress_capacity(data.len()));
    MultiGzDecoder::new(data)
        .take(MAX_LIST_SIZE as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|source| FetchError::Decompress {
            url: url.to_string(),
            source,
        })?;

    if out.len() > MAX_LIST_SIZE {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            size: out.len(),
            max: MAX_LIST_SIZE,
        });
    }
    Ok(out)
}

/// Write `contents` to `path` through a temp file in the same directory.
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FetchError> {
    let cache_err = |source: std::io::Error| FetchError::CacheWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent_dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent_dir).map_err(cache_err)?;

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(cache_err)?;
    temp_file.write_all(contents).map_err(cache_err)?;
    temp_file.as_file().sync_all().map_err(cache_err)?;
    temp_file.persist(path).map_err(|e| cache_err(e.error))?;

    debug!(path = ?path, "saved blocklist to cache");
    Ok(())
}
