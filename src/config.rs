//! Configuration management for Blocklister.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sources::{self, SourceSpec, REGISTRY};

/// Parse an interval such as "20s", "30m", "4h" or "1d".
/// Requires ASCII-only input to prevent Unicode-related edge cases.
pub fn parse_interval(interval: &str) -> Option<Duration> {
    if !interval.is_ascii() || interval.len() < 2 {
        return None;
    }

    let (num_part, suffix) = interval.split_at(interval.len() - 1);
    let value: u64 = num_part.parse().ok()?;
    let secs = match suffix {
        "s" => value,
        "m" => value.checked_mul(60)?,
        "h" => value.checked_mul(3600)?,
        "d" => value.checked_mul(86400)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding one cache file per source
    pub cache_dir: PathBuf,

    /// How often the updater checks every source
    pub update_interval: String,

    /// Age after which a cache file is refetched
    pub refresh_interval: String,

    /// Per-source refresh interval (source id -> interval)
    pub refresh_overrides: BTreeMap<String, String>,

    /// Per-source download URL replacing the built-in one (source id -> URL)
    pub mirrors: BTreeMap<String, String>,

    /// Sources to manage; empty means every registered source
    pub sources: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/var/cache/blocklister"),
            update_interval: "20s".to_string(),
            refresh_interval: "1d".to_string(),
            refresh_overrides: BTreeMap::new(),
            mirrors: BTreeMap::new(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path.as_ref());
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("update_interval", &self.update_interval),
            ("refresh_interval", &self.refresh_interval),
        ] {
            match parse_interval(value) {
                Some(d) if !d.is_zero() => {}
                _ => anyhow::bail!(
                    "Invalid {} '{}'. Use format like '20s', '30m', '4h', '1d'",
                    field,
                    value
                ),
            }
        }

        for id in &self.sources {
            sources::lookup(id).with_context(|| format!("Invalid entry in sources: '{}'", id))?;
        }

        for (id, interval) in &self.refresh_overrides {
            sources::lookup(id)
                .with_context(|| format!("Invalid source in refresh_overrides: '{}'", id))?;
            match parse_interval(interval) {
                Some(d) if !d.is_zero() => {}
                _ => anyhow::bail!("Invalid refresh interval '{}' for source '{}'", interval, id),
            }
        }

        for (id, url) in &self.mirrors {
            sources::lookup(id).with_context(|| format!("Invalid source in mirrors: '{}'", id))?;
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("Mirror for '{}' must be an http(s) URL: {}", id, url);
            }
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Poll interval of the updater loop
    pub fn update_interval(&self) -> Duration {
        parse_interval(&self.update_interval).unwrap_or(Duration::from_secs(20))
    }

    /// Refresh interval for one source, honouring overrides
    pub fn refresh_interval_for(&self, id: &str) -> Duration {
        self.refresh_overrides
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .and_then(|(_, value)| parse_interval(value))
            .or_else(|| parse_interval(&self.refresh_interval))
            .unwrap_or(sources::DEFAULT_REFRESH_INTERVAL)
    }

    /// Mirror URL for one source, if configured
    pub fn mirror_for(&self, id: &str) -> Option<&str> {
        self.mirrors
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(id))
            .map(|(_, url)| url.as_str())
    }

    /// Selected sources in registry order, with refresh intervals applied
    pub fn selected_sources(&self) -> Vec<SourceSpec> {
        REGISTRY
            .iter()
            .filter(|spec| {
                self.sources.is_empty()
                    || self
                        .sources
                        .iter()
                        .any(|id| id.trim().eq_ignore_ascii_case(spec.id))
            })
            .map(|spec| {
                spec.clone()
                    .with_refresh_interval(self.refresh_interval_for(spec.id))
            })
            .collect()
    }

    /// Generate default config with comments
    pub fn generate_default_yaml() -> String {
        include_str!("../templates/config.yaml").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/blocklister"));
        assert_eq!(config.update_interval(), Duration::from_secs(20));
        assert_eq!(config.refresh_interval_for("ads"), Duration::from_secs(86400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("4h"), Some(Duration::from_secs(4 * 3600)));
        assert_eq!(parse_interval("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_interval("1d"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_interval("60s"), Some(Duration::from_secs(60)));

        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("h"), None);
        assert_eq!(parse_interval("4"), None);
        assert_eq!(parse_interval("4x"), None);
        assert_eq!(parse_interval("-4h"), None);
        assert_eq!(parse_interval("abc"), None);

        // Non-ASCII is rejected
        assert_eq!(parse_interval("４h"), None);
        assert_eq!(parse_interval("4ℎ"), None);
    }

    #[test]
    fn test_parse_interval_overflow() {
        assert_eq!(parse_interval("99999999999999999999d"), None);
        assert_eq!(parse_interval(&format!("{}d", u64::MAX)), None);
    }

    #[test]
    fn test_default_yaml_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&Config::generate_default_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.update_interval, "20s");
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config {
            sources: vec!["ads".to_string()],
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("cache_dir: /tmp/bl\n").unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/bl"));
        assert_eq!(config.refresh_interval, "1d");
    }

    #[test]
    fn test_validation_invalid_interval() {
        let config = Config {
            update_interval: "soon".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid update_interval"));
    }

    #[test]
    fn test_validation_zero_interval() {
        let config = Config {
            refresh_interval: "0s".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_unknown_source() {
        let config = Config {
            sources: vec!["ads".to_string(), "nonexisting".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_override() {
        let mut config = Config::default();
        config
            .refresh_overrides
            .insert("ads".to_string(), "fast".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_mirror() {
        let mut config = Config::default();
        config
            .mirrors
            .insert("ads".to_string(), "ftp://mirror/ads.gz".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Mirror"));
    }

    #[test]
    fn test_refresh_override_case_insensitive() {
        let mut config = Config::default();
        config
            .refresh_overrides
            .insert("Spamhausdrop".to_string(), "12h".to_string());
        assert_eq!(
            config.refresh_interval_for("spamhausdrop"),
            Duration::from_secs(12 * 3600)
        );
        assert_eq!(config.refresh_interval_for("ads"), Duration::from_secs(86400));
    }

    #[test]
    fn test_selected_sources_all_by_default() {
        let config = Config::default();
        let selected = config.selected_sources();
        assert_eq!(selected.len(), REGISTRY.len());
        assert_eq!(selected[0].id, REGISTRY[0].id);
    }

    #[test]
    fn test_selected_sources_subset_in_registry_order() {
        let mut config = Config {
            sources: vec!["SpamhausDrop".to_string(), "ads".to_string()],
            ..Default::default()
        };
        config
            .refresh_overrides
            .insert("ads".to_string(), "2h".to_string());

        let selected = config.selected_sources();
        let ids: Vec<&str> = selected.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["ads", "spamhausdrop"]);
        assert_eq!(selected[0].refresh_interval, Duration::from_secs(7200));
    }

    #[test]
    fn test_mirror_for() {
        let mut config = Config::default();
        config
            .mirrors
            .insert("ads".to_string(), "https://mirror.example/ads.gz".to_string());
        assert_eq!(config.mirror_for("ADS"), Some("https://mirror.example/ads.gz"));
        assert_eq!(config.mirror_for("edu"), None);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blocklister.yaml");
        let config = Config {
            cache_dir: temp.path().join("cache"),
            sources: vec!["edu".to_string()],
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/blocklister.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/blocklister.yaml").unwrap();
        assert_eq!(config, Config::default());
    }
}
