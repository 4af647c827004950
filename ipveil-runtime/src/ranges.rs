//! Curated VPN/datacenter range data
//!
//! Ranges live in a JSON data file so operators can swap in their own feed
//! without a rebuild. A compiled-in snapshot backs the default engine.

use cidr::IpCidr;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Snapshot shipped with the binary
const EMBEDDED_RANGES: &str = include_str!("../../data/vpn_ranges.json");

#[derive(Debug, Deserialize)]
struct RangeFile {
    ranges: Vec<RangeEntry>,
}

#[derive(Debug, Deserialize)]
struct RangeEntry {
    cidr: String,
    #[allow(dead_code)]
    provider: Option<String>,
}

/// Parse a range file body. Entries that fail to parse are skipped with a
/// warning rather than poisoning the whole list.
pub fn parse_ranges(body: &str) -> Result<Vec<IpCidr>, serde_json::Error> {
    let file: RangeFile = serde_json::from_str(body)?;
    let mut ranges = Vec::with_capacity(file.ranges.len());
    for entry in file.ranges {
        match IpCidr::from_str(&entry.cidr) {
            Ok(cidr) => ranges.push(cidr),
            Err(e) => warn!(cidr = %entry.cidr, error = %e, "skipping unparseable range"),
        }
    }
    Ok(ranges)
}

/// The compiled-in range snapshot
pub fn default_ranges() -> Vec<IpCidr> {
    // The embedded file is validated by tests; an empty list is the worst case
    parse_ranges(EMBEDDED_RANGES).unwrap_or_default()
}

/// Load ranges from an operator-supplied file
pub fn load_ranges(path: &Path) -> std::io::Result<Vec<IpCidr>> {
    let body = std::fs::read_to_string(path)?;
    parse_ranges(&body).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
