//! Range summarization: contiguous-run merging and CIDR decomposition.

use std::collections::HashSet;

use ipnet::{Ipv4Net, Ipv4Subnets};

use crate::error::Result;
use crate::range::Range;

/// Merge ranges into the minimal set of disjoint, non-adjacent ranges.
///
/// Overlapping ranges and ranges that touch (`[a, b]`, `[b + 1, c]`) are
/// merged. The result is sorted by start address, and summarizing it again
/// returns it unchanged. Works on endpoints only, so a `/8` costs the same
/// as a single address.
pub fn summarize<I>(ranges: I) -> Vec<Range>
where
    I: IntoIterator<Item = Range>,
{
    let mut sorted: Vec<Range> = ranges.into_iter().collect();
    sorted.sort_unstable();

    let mut merged: Vec<Range> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if u64::from(range.start()) <= u64::from(last.end()) + 1 => {
                if range.end() > last.end() {
                    *last = Range::new(last.start(), range.end());
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Summarize raw `A.B.C.D` / `A.B.C.D-E.F.G.H` entries from one or more lists.
pub fn summarize_strings<S: AsRef<str>>(entries: &[S]) -> Result<Vec<String>> {
    let ranges = entries
        .iter()
        .map(|entry| entry.as_ref().parse::<Range>())
        .collect::<Result<Vec<_>>>()?;
    Ok(summarize(ranges).iter().map(Range::to_string).collect())
}

/// Split one range into the minimal sequence of CIDR blocks covering it.
///
/// Blocks are emitted in ascending order, without gaps or overlap.
pub fn range_to_cidrs(range: Range) -> Vec<Ipv4Net> {
    Ipv4Subnets::new(range.start_addr(), range.end_addr(), 0).collect()
}

/// CIDR decomposition of every range, in input order.
pub fn ranges_to_cidrs(ranges: &[Range]) -> Vec<Ipv4Net> {
    ranges.iter().copied().flat_map(range_to_cidrs).collect()
}

/// Minimal CIDR cover of the union of `ranges`.
pub fn aggregate(ranges: &[Range]) -> Vec<Ipv4Net> {
    ranges_to_cidrs(&summarize(ranges.iter().copied()))
}

/// Drop duplicate ranges, returning the unique set and how many were removed.
pub fn deduplicate<I>(ranges: I) -> (Vec<Range>, usize)
where
    I: IntoIterator<Item = Range>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = 0;
    for range in ranges {
        if seen.insert(range) {
            unique.push(range);
        } else {
            duplicates += 1;
        }
    }
    (unique, duplicates)
}

/// Total number of addresses covered by a list of ranges (overlaps counted twice).
pub fn count_addresses(ranges: &[Range]) -> u64 {
    ranges
        .iter()
        .map(Range::address_count)
        .fold(0u64, |acc, n| acc.saturating_add(n))
}

/// What percentage of the IPv4 space is covered.
pub fn coverage_percent(address_count: u64) -> f64 {
    const IPV4_SPACE: f64 = 4_294_967_296.0;
    (address_count as f64 / IPV4_SPACE) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> Range {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_of_one() {
        let result = summarize_strings(&["213.239.193.209-213.239.193.209"]).unwrap();
        assert_eq!(result, vec!["213.239.193.209"]);
    }

    #[test]
    fn test_ordinary_range() {
        let result = summarize_strings(&["213.221.87.72-213.221.87.79"]).unwrap();
        assert_eq!(result, vec!["213.221.87.72-213.221.87.79"]);
    }

    #[test]
    fn test_range_overflow_not_merged() {
        let result = summarize_strings(&["72.32.242.248-72.32.243.255", "64.69.78.73"]).unwrap();
        assert_eq!(result, vec!["64.69.78.73", "72.32.242.248-72.32.243.255"]);
    }

    #[test]
    fn test_reverse_order() {
        let result = summarize_strings(&["72.32.243.255-72.32.242.248"]).unwrap();
        assert_eq!(result, vec!["72.32.242.248-72.32.243.255"]);
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let merged = summarize(vec![r("10.0.0.0-10.0.0.9"), r("10.0.0.10-10.0.0.20")]);
        assert_eq!(merged, vec![r("10.0.0.0-10.0.0.20")]);
    }

    #[test]
    fn test_adjacent_single_addresses_merge() {
        let merged = summarize(vec![r("1.1.1.3"), r("1.1.1.1"), r("1.1.1.2"), r("1.1.1.5")]);
        let rendered: Vec<String> = merged.iter().map(Range::to_string).collect();
        assert_eq!(rendered, vec!["1.1.1.1-1.1.1.3", "1.1.1.5"]);
    }

    #[test]
    fn test_overlapping_and_contained() {
        let merged = summarize(vec![
            r("10.0.0.0-10.0.0.100"),
            r("10.0.0.50-10.0.0.60"),
            r("10.0.0.90-10.0.1.0"),
        ]);
        assert_eq!(merged, vec![r("10.0.0.0-10.0.1.0")]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let merged = summarize(vec![r("1.2.3.4"), r("1.2.3.4")]);
        assert_eq!(merged, vec![r("1.2.3.4")]);
    }

    #[test]
    fn test_full_space_edge() {
        let merged = summarize(vec![
            Range::new(u32::MAX - 1, u32::MAX),
            Range::new(0, 0),
            Range::single(u32::MAX),
        ]);
        assert_eq!(merged, vec![Range::new(0, 0), Range::new(u32::MAX - 1, u32::MAX)]);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(Vec::new()).is_empty());
    }

    #[test]
    fn test_summarize_strings_invalid() {
        assert!(summarize_strings(&["1.1.1.1", "bogus"]).is_err());
    }

    #[test]
    fn test_cidr_golden_1_1_1_1_to_2_2_2_2() {
        let expected = [
            "1.1.1.1/32",
            "1.1.1.2/31",
            "1.1.1.4/30",
            "1.1.1.8/29",
            "1.1.1.16/28",
            "1.1.1.32/27",
            "1.1.1.64/26",
            "1.1.1.128/25",
            "1.1.2.0/23",
            "1.1.4.0/22",
            "1.1.8.0/21",
            "1.1.16.0/20",
            "1.1.32.0/19",
            "1.1.64.0/18",
            "1.1.128.0/17",
            "1.2.0.0/15",
            "1.4.0.0/14",
            "1.8.0.0/13",
            "1.16.0.0/12",
            "1.32.0.0/11",
            "1.64.0.0/10",
            "1.128.0.0/9",
            "2.0.0.0/15",
            "2.2.0.0/23",
            "2.2.2.0/31",
            "2.2.2.2/32",
        ];
        let blocks: Vec<String> = range_to_cidrs(r("1.1.1.1-2.2.2.2"))
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(blocks.len(), 26);
        assert_eq!(blocks, expected);
    }

    #[test]
    fn test_cidr_single_address() {
        let blocks = range_to_cidrs(r("3.3.3.3"));
        assert_eq!(blocks, vec!["3.3.3.3/32".parse::<Ipv4Net>().unwrap()]);
    }

    #[test]
    fn test_cidr_aligned_block() {
        let blocks = range_to_cidrs(r("192.168.0.0-192.168.255.255"));
        assert_eq!(blocks, vec!["192.168.0.0/16".parse::<Ipv4Net>().unwrap()]);
    }

    #[test]
    fn test_cidr_whole_space() {
        let blocks = range_to_cidrs(Range::new(0, u32::MAX));
        assert_eq!(blocks, vec!["0.0.0.0/0".parse::<Ipv4Net>().unwrap()]);
    }

    #[test]
    fn test_cidr_top_of_space() {
        let blocks = range_to_cidrs(r("255.255.255.254-255.255.255.255"));
        assert_eq!(blocks, vec!["255.255.255.254/31".parse::<Ipv4Net>().unwrap()]);
    }

    #[test]
    fn test_cidr_unaligned_both_ends() {
        let blocks = range_to_cidrs(r("0.0.0.1-255.255.255.254"));
        assert_eq!(blocks.len(), 62);
        assert_eq!(blocks[0].to_string(), "0.0.0.1/32");
        assert_eq!(blocks[30].to_string(), "64.0.0.0/2");
        assert_eq!(blocks[31].to_string(), "128.0.0.0/2");
        assert_eq!(blocks[61].to_string(), "255.255.255.254/32");
        let covered: u64 = blocks.iter().map(|b| 1u64 << (32 - b.prefix_len())).sum();
        assert_eq!(covered, (1u64 << 32) - 2);
    }

    #[test]
    fn test_aggregate_merges_before_splitting() {
        let blocks = aggregate(&[r("192.168.0.0/25"), r("192.168.0.128/25")]);
        assert_eq!(blocks, vec!["192.168.0.0/24".parse::<Ipv4Net>().unwrap()]);
    }

    #[test]
    fn test_deduplicate() {
        let (unique, dups) = deduplicate(vec![r("1.1.1.1"), r("1.1.1.1"), r("2.2.2.2")]);
        assert_eq!(unique.len(), 2);
        assert_eq!(dups, 1);
    }

    #[test]
    fn test_count_addresses() {
        let ranges = vec![r("192.168.0.0/24"), r("10.0.0.0/8")];
        assert_eq!(count_addresses(&ranges), 256 + 16_777_216);
        assert_eq!(count_addresses(&[Range::new(0, u32::MAX)]), 1u64 << 32);
    }

    #[test]
    fn test_coverage_percent() {
        assert_eq!(coverage_percent(1u64 << 32), 100.0);
        assert_eq!(coverage_percent(0), 0.0);
    }
}
