//! Inclusive IPv4 address ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::error::BlocklisterError;

/// An inclusive interval `[start, end]` of IPv4 addresses.
///
/// `start <= end` always holds; constructors swap reversed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    start: u32,
    end: u32,
}

impl Range {
    /// Build a range, swapping the bounds if they are reversed.
    pub fn new(start: u32, end: u32) -> Self {
        if start > end {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn single(addr: u32) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    pub fn from_addrs(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self::new(u32::from(start), u32::from(end))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn start_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start)
    }

    pub fn end_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.end)
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of addresses covered, between 1 and 2^32.
    pub fn address_count(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr <= self.end
    }
}

impl From<Ipv4Net> for Range {
    fn from(net: Ipv4Net) -> Self {
        Self::from_addrs(net.network(), net.broadcast())
    }
}

impl From<Ipv4Addr> for Range {
    fn from(addr: Ipv4Addr) -> Self {
        Self::single(u32::from(addr))
    }
}

/// Renders `A.B.C.D` for a single address, `A.B.C.D-E.F.G.H` otherwise.
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start_addr())
        } else {
            write!(f, "{}-{}", self.start_addr(), self.end_addr())
        }
    }
}

/// Parses `A.B.C.D`, `A.B.C.D-E.F.G.H` (whitespace tolerated) or `A.B.C.D/N`.
impl FromStr for Range {
    type Err = BlocklisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.split_whitespace().collect();
        let invalid = || BlocklisterError::InvalidRange(s.to_string());

        if let Some((start, end)) = compact.split_once('-') {
            let start: Ipv4Addr = start.parse().map_err(|_| invalid())?;
            let end: Ipv4Addr = end.parse().map_err(|_| invalid())?;
            return Ok(Self::from_addrs(start, end));
        }

        if compact.contains('/') {
            let net: Ipv4Net = compact.parse().map_err(|_| invalid())?;
            return Ok(Self::from(net.trunc()));
        }

        compact
            .parse::<Ipv4Addr>()
            .map(Self::from)
            .map_err(|_| invalid())
    }
}
