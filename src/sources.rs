//! Static registry of known blocklist providers.
//!
//! Every provider is one [`SourceSpec`] entry in [`REGISTRY`]. Adding a
//! provider means adding a row here; the fetch and parse behaviour is shared
//! and selected by the entry's [`LineFormat`] and `compressed` flag.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BlocklisterError, Result};

/// Default staleness threshold for a cache file (one day).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const IPV4: &str = r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})";

static BARE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*{IPV4}(?:\s.*)?$")).expect("valid regex"));

static DASH_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*{IPV4}\s*-\s*{IPV4}\s*$")).expect("valid regex"));

static CIDR_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{IPV4}/(\d{{1,2}})\s*(?:;.*)?$")).expect("valid regex")
});

static LABEL_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^.*:{IPV4}-{IPV4}\s*$")).expect("valid regex"));

/// Line shape of a provider's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    /// `A.B.C.D`, optionally followed by whitespace and free text.
    BareAddress,
    /// `A.B.C.D-E.F.G.H`
    DashRange,
    /// `A.B.C.D/N ; comment`
    CidrComment,
    /// `label:A.B.C.D-E.F.G.H` (PeerGuardian p2p format)
    LabelRange,
}

impl LineFormat {
    /// Anchored pattern recognising this line shape.
    pub fn pattern(&self) -> &'static Regex {
        match self {
            LineFormat::BareAddress => &BARE_ADDRESS,
            LineFormat::DashRange => &DASH_RANGE,
            LineFormat::CidrComment => &CIDR_COMMENT,
            LineFormat::LabelRange => &LABEL_RANGE,
        }
    }

    /// Number of capture groups a matching line must produce.
    pub fn expected_groups(&self) -> usize {
        match self {
            LineFormat::BareAddress => 1,
            LineFormat::DashRange | LineFormat::CidrComment | LineFormat::LabelRange => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LineFormat::BareAddress => "address",
            LineFormat::DashRange => "range",
            LineFormat::CidrComment => "cidr",
            LineFormat::LabelRange => "p2p",
        }
    }
}

impl fmt::Display for LineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptor of one blocklist provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub id: &'static str,
    pub url: &'static str,
    pub format: LineFormat,
    /// Payload is a gzip archive.
    pub compressed: bool,
    pub refresh_interval: Duration,
}

impl SourceSpec {
    const fn new(id: &'static str, url: &'static str, format: LineFormat, compressed: bool) -> Self {
        Self {
            id,
            url,
            format,
            compressed,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    const fn iblocklist(id: &'static str, url: &'static str) -> Self {
        Self::new(id, url, LineFormat::LabelRange, true)
    }

    /// Cache file name, derived from the identifier.
    pub fn cache_filename(&self) -> String {
        format!("{}.txt", self.id)
    }

    pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.cache_filename())
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// All known providers, in update order.
pub static REGISTRY: &[SourceSpec] = &[
    SourceSpec::iblocklist("ads", "https://list.iblocklist.com/?list=bt_ads&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("spyware", "https://list.iblocklist.com/?list=bt_spyware&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("level1", "https://list.iblocklist.com/?list=ydxerpxkpcfqjaybcssw&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("level2", "https://list.iblocklist.com/?list=gyisgnzbhppbvsphucsw&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("level3", "https://list.iblocklist.com/?list=uwnukjqktoggdknzrhgh&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("edu", "https://list.iblocklist.com/?list=imlmncgrkbnacgcwfjvh&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("proxy", "https://list.iblocklist.com/?list=xoebmbyexwuiogmbyprb&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("badpeers", "https://list.iblocklist.com/?list=cwworuawihqvocglcoss&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("microsoft", "https://list.iblocklist.com/?list=xshktygkujudfnjfioro&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("spider", "https://list.iblocklist.com/?list=mcvxsnihddgutbjfbghy&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("hijacked", "https://list.iblocklist.com/?list=usrcshglbiilevmyfhse&fileformat=p2p&archiveformat=gz"),
    SourceSpec::iblocklist("dshield", "https://list.iblocklist.com/?list=xpbqleszmajjesnzddhv&fileformat=p2p&archiveformat=gz"),
    SourceSpec::new("spamhausdrop", "https://www.spamhaus.org/drop/drop.txt", LineFormat::CidrComment, false),
    SourceSpec::new("spamhausedrop", "https://www.spamhaus.org/drop/edrop.txt", LineFormat::CidrComment, false),
    SourceSpec::new("blocklistde_all", "https://lists.blocklist.de/lists/all.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_ssh", "https://lists.blocklist.de/lists/ssh.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_mail", "https://lists.blocklist.de/lists/mail.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_imap", "https://lists.blocklist.de/lists/imap.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_apache", "https://lists.blocklist.de/lists/apache.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_ftp", "https://lists.blocklist.de/lists/ftp.txt", LineFormat::BareAddress, false),
    SourceSpec::new("blocklistde_strongips", "https://lists.blocklist.de/lists/strongips.txt", LineFormat::BareAddress, false),
    SourceSpec::new("malwaredomainlist", "http://www.malwaredomainlist.com/hostslist/ip.txt", LineFormat::BareAddress, false),
];

/// Look up a provider by identifier, ignoring case.
pub fn lookup(id: &str) -> Result<&'static SourceSpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| BlocklisterError::UnknownSource(id.to_string()))
}

/// Identifiers of every registered provider.
pub fn source_ids() -> Vec<&'static str> {
    REGISTRY.iter().map(|spec| spec.id).collect()
}
