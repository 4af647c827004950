//! DNS blocklist queries
//!
//! Each zone is queried as `<reversed-octets>.<zone>`; any A record in
//! 127.0.0.0/8 counts as a listing. NXDOMAIN means not listed.

use std::net::IpAddr;
use tracing::debug;

use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use ipveil_core::DnsblReport;

/// Blocklist zones queried for every IPv4 detection
pub const DNSBL_ZONES: &[&str] = &[
    "zen.spamhaus.org",
    "dnsbl.sorbs.net",
    "bl.spamcop.net",
    "cbl.abuseat.org",
    "dnsbl.njabl.org",
    "b.barracudacentral.org",
];

/// Query every blocklist zone concurrently.
///
/// IPv6 addresses are not covered by these zones, and a fully failed query
/// round gives nothing to score; both cases yield `None` so the signal stays
/// Absent.
pub async fn check_blocklists(
    resolver: &TokioAsyncResolver,
    ip: IpAddr,
) -> Option<DnsblReport> {
    let octets = match ip {
        IpAddr::V4(v4) => v4.octets(),
        IpAddr::V6(_) => return None,
    };
    let reversed = format!("{}.{}.{}.{}", octets[3], octets[2], octets[1], octets[0]);

    let queries = DNSBL_ZONES
        .iter()
        .map(|zone| query_zone(resolver, &reversed, zone));
    let outcomes = futures::future::join_all(queries).await;

    let mut listed = Vec::new();
    let mut checked = 0;
    for (zone, outcome) in DNSBL_ZONES.iter().zip(outcomes) {
        match outcome {
            Some(true) => {
                checked += 1;
                listed.push(zone.to_string());
            }
            Some(false) => checked += 1,
            None => {}
        }
    }

    if checked == 0 {
        debug!(%ip, "all blocklist queries failed");
        return None;
    }
    Some(DnsblReport { listed, checked })
}

/// One zone query: `Some(true)` listed, `Some(false)` clean, `None` unreachable
async fn query_zone(
    resolver: &TokioAsyncResolver,
    reversed: &str,
    zone: &str,
) -> Option<bool> {
    let name = format!("{reversed}.{zone}.");
    match resolver.ipv4_lookup(name).await {
        Ok(lookup) => {
            let hit = lookup.iter().any(|a| a.octets()[0] == 127);
            Some(hit)
        }
        Err(err) => match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Some(false),
            _ => {
                debug!(zone, error = %err, "blocklist query failed");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_resolver, NetConfig};

    #[tokio::test]
    async fn test_ipv6_not_checked() {
        let resolver = create_resolver(&NetConfig::default());
        let report = check_blocklists(&resolver, "::1".parse().unwrap()).await;
        assert!(report.is_none());
    }
}
