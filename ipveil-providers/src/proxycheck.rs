//! ProxyCheck.io adapter - proxy type and risk score
//!
//! The response body is keyed by the queried address, so the entry map is
//! flattened out next to the status field.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct ProxyCheckAdapter {
    client: Client,
    api_key: String,
}

impl ProxyCheckAdapter {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for ProxyCheckAdapter {
    fn name(&self) -> &'static str {
        "proxycheck"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let url = format!(
            "https://proxycheck.io/v2/{ip}?key={}&vpn=1&asn=1&risk=1",
            self.api_key
        );
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "proxycheck request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "proxycheck returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: ProxyCheckResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse proxycheck response");
                return ProviderOutcome::Unavailable;
            }
        };
        if body.status != "ok" {
            debug!(%ip, status = %body.status, "proxycheck lookup failed");
            return ProviderOutcome::Unavailable;
        }
        let Some(entry) = body.entries.get(&ip.to_string()) else {
            debug!(%ip, "proxycheck response missing address entry");
            return ProviderOutcome::Unavailable;
        };

        let is_proxy = entry.proxy.as_deref() == Some("yes");
        let kind = entry.kind.as_deref().unwrap_or("");
        ProviderOutcome::Available(IntelRecord {
            source: "proxycheck",
            country: entry.isocode.as_ref().map(|c| c.to_uppercase()),
            organization: entry.provider.clone(),
            proxy: Some(is_proxy),
            vpn: Some(is_proxy && kind.eq_ignore_ascii_case("vpn")),
            tor: Some(is_proxy && kind.eq_ignore_ascii_case("tor")),
            risk: entry.risk,
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProxyCheckResponse {
    status: String,
    #[serde(flatten)]
    entries: HashMap<String, ProxyCheckEntry>,
}

#[derive(Debug, Deserialize)]
struct ProxyCheckEntry {
    proxy: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    risk: Option<f64>,
    isocode: Option<String>,
    provider: Option<String>,
}
