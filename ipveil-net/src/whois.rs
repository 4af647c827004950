//! Raw registry WHOIS over port 43
//!
//! Registries are tried in order until one answers with usable fields. The
//! response is plain line-oriented text; referral handling is deliberately
//! absent, the regional registries carry the fields we score on.

use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use ipveil_core::WhoisReport;

use crate::{NetConfig, ProbeError};

/// Regional registries, tried in order
pub const REGISTRY_SERVERS: &[&str] = &[
    "whois.arin.net",
    "whois.ripe.net",
    "whois.apnic.net",
    "whois.lacnic.net",
    "whois.afrinic.net",
];

/// Fetch and parse WHOIS for an address, trying each registry in turn.
///
/// Returns `None` when no registry answered; the signal then stays Absent.
pub async fn lookup_whois(ip: IpAddr, config: &NetConfig) -> Option<WhoisReport> {
    for server in REGISTRY_SERVERS {
        match query_registry(server, ip, config.whois_timeout).await {
            Ok(text) => {
                let report = parse_response(&text);
                if report.organization.is_some()
                    || report.netname.is_some()
                    || report.description.is_some()
                {
                    return Some(report);
                }
            }
            Err(err) => {
                debug!(server, %ip, error = %err, "whois query failed");
            }
        }
    }
    None
}

async fn query_registry(
    server: &str,
    ip: IpAddr,
    query_timeout: Duration,
) -> Result<String, ProbeError> {
    let fut = async {
        let mut stream = TcpStream::connect((server, 43)).await?;
        stream.write_all(format!("{ip}\r\n").as_bytes()).await?;
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        Ok::<_, ProbeError>(String::from_utf8_lossy(&response).into_owned())
    };
    let text = timeout(query_timeout, fut)
        .await
        .map_err(|_| ProbeError::Timeout(query_timeout))??;
    if text.trim().is_empty() {
        return Err(ProbeError::EmptyResponse(server.to_string()));
    }
    Ok(text)
}

/// Parse the line-oriented registry response. First occurrence of each field
/// wins; comment lines are skipped.
pub fn parse_response(text: &str) -> WhoisReport {
    let mut report = WhoisReport::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "orgname" | "org-name" | "organization" | "owner" => {
                report.organization.get_or_insert_with(|| value.to_string());
            }
            "netname" => {
                report.netname.get_or_insert_with(|| value.to_string());
            }
            "descr" | "comment" => {
                report.description.get_or_insert_with(|| value.to_string());
            }
            "origin" | "originas" => {
                report.asn.get_or_insert_with(|| value.to_string());
            }
            "country" => {
                report.country.get_or_insert_with(|| value.to_uppercase());
            }
            _ => {}
        }
    }

    report
}
