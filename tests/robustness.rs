//! Robustness tests for edge cases and error conditions.
//!
//! These tests verify that Blocklister handles hostile or broken feeds
//! and unreachable servers gracefully.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use blocklister::aggregator::{aggregate, count_addresses, summarize};
use blocklister::fetcher::{build_client, Fetcher};
use blocklister::parser::parse_str;
use blocklister::service::Blocklister;
use blocklister::sources::{lookup, LineFormat};
use blocklister::{BlocklisterError, FetchError, Range};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(id: &str, dir: &std::path::Path, url: String) -> Arc<Fetcher> {
    let spec = lookup(id).unwrap().clone();
    Arc::new(
        Fetcher::new(spec, dir, build_client().unwrap())
            .with_url(url)
            .with_retry(1, Duration::from_millis(1)),
    )
}

/// Malformed lines never abort parsing of the rest of the feed
#[test]
fn test_garbage_lines_are_skipped() {
    let feed = "\u{feff}# header\n\
                \n\
                999.1.1.1\n\
                1.2.3.4\n\
                not an address\n\
                1.2.3\n\
                \t5.6.7.8   # trailing comment\n\
                \x00\x01\x02\n";
    let mut ranges = parse_str(LineFormat::BareAddress, feed);
    let out: Vec<String> = ranges.by_ref().map(|r| r.to_string()).collect();
    assert_eq!(out, vec!["1.2.3.4", "5.6.7.8"]);

    let stats = ranges.stats();
    assert_eq!(stats.lines, 8);
    assert_eq!(stats.ranges, 2);
    assert_eq!(stats.dropped, 1);
}

/// Invalid UTF-8 in a feed is tolerated
#[test]
fn test_invalid_utf8_feed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("feed.txt");
    fs::write(&path, b"Caf\xe9 Net:10.0.0.0-10.0.0.255\n\xff\xfe\n").unwrap();

    let ranges: Vec<Range> = blocklister::parser::parse_file(LineFormat::LabelRange, &path)
        .unwrap()
        .collect();
    assert_eq!(ranges, vec!["10.0.0.0-10.0.0.255".parse().unwrap()]);
}

/// Reversed ranges are normalized, never rejected
#[test]
fn test_reversed_range_lines() {
    let ranges: Vec<Range> =
        parse_str(LineFormat::DashRange, "10.0.0.9 - 10.0.0.1\n10.0.0.1-10.0.0.9\n").collect();
    assert_eq!(summarize(ranges), vec!["10.0.0.1-10.0.0.9".parse().unwrap()]);
}

/// Huge blocks are merged on endpoints without expanding addresses
#[test]
fn test_whole_address_space() {
    let ranges: Vec<Range> = parse_str(
        LineFormat::CidrComment,
        "0.0.0.0/1 ; a\n128.0.0.0/1 ; b\n10.0.0.0/8 ; inside\n",
    )
    .collect();
    let merged = summarize(ranges);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].to_string(), "0.0.0.0-255.255.255.255");
    assert_eq!(count_addresses(&merged), 1u64 << 32);
    assert_eq!(aggregate(&merged)[0].to_string(), "0.0.0.0/0");
}

/// Prefixes beyond /32 are dropped rather than misread
#[test]
fn test_out_of_range_prefix() {
    let ranges: Vec<Range> =
        parse_str(LineFormat::CidrComment, "1.2.3.0/33 ; bad\n1.2.3.0/24 ; ok\n").collect();
    assert_eq!(ranges.len(), 1);
}

/// Unreachable server with no snapshot surfaces a delivery failure
#[tokio::test]
async fn test_unreachable_server_without_cache() {
    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_for(
        "blocklistde_ftp",
        temp.path(),
        "http://127.0.0.1:1/ftp.txt".to_string(),
    );
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Network { .. } | FetchError::Timeout { .. }));

    let service = Blocklister::from_fetchers(vec![fetcher], Duration::from_secs(20));
    let err = service.get_ranges("blocklistde_ftp", false).await.unwrap_err();
    assert!(matches!(err, BlocklisterError::CacheUnavailable { .. }));
}

/// A corrupt archive keeps the previous snapshot and is served stale
#[tokio::test]
async fn test_corrupt_archive_serves_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/level1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x1f\x8b not gzip".to_vec()))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_for("level1", temp.path(), format!("{}/level1", server.uri()));
    let previous = "Bogon:192.0.2.0-192.0.2.255\n";
    fs::write(fetcher.cache_path(), previous).unwrap();
    fs::File::options()
        .write(true)
        .open(fetcher.cache_path())
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(3 * 86400))
        .unwrap();

    let service = Blocklister::from_fetchers(vec![fetcher.clone()], Duration::from_secs(20));
    let ranges = service.get_ranges("level1", true).await.unwrap();
    assert_eq!(ranges, vec!["192.0.2.0/24"]);
    assert_eq!(fs::read_to_string(fetcher.cache_path()).unwrap(), previous);
}

/// Server errors are reported per source by the updater
#[tokio::test]
async fn test_server_error_reported_by_updater() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/edrop"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let fetcher = fetcher_for("spamhausedrop", temp.path(), format!("{}/edrop", server.uri()));
    let service = Blocklister::from_fetchers(vec![fetcher], Duration::from_secs(20));

    let report = service.updater().force_update().await;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "spamhausedrop");
    assert!(report.failed[0].1.contains("500"));
}
