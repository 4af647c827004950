//! Reverse DNS lookup

use std::net::IpAddr;
use tracing::debug;

use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use ipveil_core::RdnsReport;

/// Look up PTR records for an address.
///
/// An address with no PTR record is a real answer, not a failure: it comes
/// back as an empty report so scoring treats it as neutral. Only resolver
/// failures (timeout, SERVFAIL) yield `None`.
pub async fn reverse_ptr(resolver: &TokioAsyncResolver, ip: IpAddr) -> Option<RdnsReport> {
    match resolver.reverse_lookup(ip).await {
        Ok(lookup) => {
            let hostnames: Vec<String> = lookup
                .iter()
                .map(|name| name.to_utf8().trim_end_matches('.').to_lowercase())
                .collect();
            Some(RdnsReport { hostnames })
        }
        Err(err) => match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Some(RdnsReport::default()),
            _ => {
                debug!(%ip, error = %err, "reverse lookup failed");
                None
            }
        },
    }
}
