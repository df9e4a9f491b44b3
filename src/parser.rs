//! Line-oriented parsing of raw feed text into [`Range`]s.
//!
//! [`Ranges`] is a lazy iterator over a reader so a feed with hundreds of
//! thousands of lines never has to be materialized before summarizing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;

use ipnet::Ipv4Net;
use tracing::{debug, warn};

use crate::error::{BlocklisterError, Result};
use crate::range::Range;
use crate::sources::LineFormat;

/// Outcome of matching one line against a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Range(Range),
    /// Line does not have the format's shape (comment, header, blank).
    Skipped,
    /// Line has the right shape but a bad octet, prefix or group count.
    Dropped,
}

/// Counters collected while parsing a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub ranges: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Classify one line of feed text.
pub fn classify_line(format: LineFormat, line: &str) -> LineOutcome {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(caps) = format.pattern().captures(line) else {
        return LineOutcome::Skipped;
    };

    let groups: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
    if groups.len() != format.expected_groups() {
        return LineOutcome::Dropped;
    }

    let range = match format {
        LineFormat::BareAddress => groups[0].parse::<Ipv4Addr>().ok().map(Range::from),
        LineFormat::DashRange | LineFormat::LabelRange => {
            match (groups[0].parse::<Ipv4Addr>(), groups[1].parse::<Ipv4Addr>()) {
                (Ok(start), Ok(end)) => Some(Range::from_addrs(start, end)),
                _ => None,
            }
        }
        LineFormat::CidrComment => match (groups[0].parse::<Ipv4Addr>(), groups[1].parse::<u8>()) {
            (Ok(addr), Ok(prefix)) => Ipv4Net::new(addr, prefix)
                .ok()
                .map(|net| Range::from(net.trunc())),
            _ => None,
        },
    };

    range.map_or(LineOutcome::Dropped, LineOutcome::Range)
}

/// Map one line to zero or one range.
pub fn parse_line(format: LineFormat, line: &str) -> Option<Range> {
    match classify_line(format, line) {
        LineOutcome::Range(range) => Some(range),
        LineOutcome::Skipped | LineOutcome::Dropped => None,
    }
}

/// Lazy producer of ranges from a line reader.
pub struct Ranges<R> {
    reader: R,
    format: LineFormat,
    buf: Vec<u8>,
    stats: ParseStats,
    failed: bool,
}

impl<R: BufRead> Ranges<R> {
    pub fn new(reader: R, format: LineFormat) -> Self {
        Self {
            reader,
            format,
            buf: Vec::with_capacity(128),
            stats: ParseStats::default(),
            failed: false,
        }
    }

    /// Counters for the lines consumed so far.
    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

impl<R: BufRead> Iterator for Ranges<R> {
    type Item = Range;

    fn next(&mut self) -> Option<Range> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!("Stopped reading feed after {} lines: {}", self.stats.lines, e);
                    self.failed = true;
                    return None;
                }
            }
            self.stats.lines += 1;

            // Feeds are mostly ASCII; tolerate stray bytes instead of failing the line.
            let line = String::from_utf8_lossy(&self.buf);
            match classify_line(self.format, &line) {
                LineOutcome::Range(range) => {
                    self.stats.ranges += 1;
                    return Some(range);
                }
                LineOutcome::Skipped => self.stats.skipped += 1,
                LineOutcome::Dropped => {
                    self.stats.dropped += 1;
                    debug!("Dropped malformed line: {}", line.trim_end());
                }
            }
        }
    }
}

/// Parse an in-memory feed.
pub fn parse_str(format: LineFormat, content: &str) -> Ranges<&[u8]> {
    Ranges::new(content.as_bytes(), format)
}

/// Open a cache file and parse it lazily.
pub fn parse_file(format: LineFormat, path: &Path) -> Result<Ranges<BufReader<File>>> {
    let file = File::open(path).map_err(|source| BlocklisterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Ranges::new(BufReader::new(file), format))
}
