//! IPQualityScore adapter - fraud score plus vpn/proxy/tor flags

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct IpqsAdapter {
    client: Client,
    api_key: String,
}

impl IpqsAdapter {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for IpqsAdapter {
    fn name(&self) -> &'static str {
        "ipqualityscore"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let url = format!(
            "https://ipqualityscore.com/api/json/ip/{}/{ip}?strictness=2",
            self.api_key
        );
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "ipqualityscore request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "ipqualityscore returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: IpqsResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse ipqualityscore response");
                return ProviderOutcome::Unavailable;
            }
        };
        if !body.success {
            debug!(%ip, message = ?body.message, "ipqualityscore lookup failed");
            return ProviderOutcome::Unavailable;
        }

        ProviderOutcome::Available(IntelRecord {
            source: "ipqualityscore",
            country: body.country_code.map(|c| c.to_uppercase()),
            organization: body.organization.or(body.isp),
            hosting: Some(body.is_datacenter),
            proxy: Some(body.proxy),
            vpn: Some(body.vpn),
            tor: Some(body.tor),
            fraud_score: Some(body.fraud_score),
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpqsResponse {
    success: bool,
    message: Option<String>,
    fraud_score: f64,
    country_code: Option<String>,
    isp: Option<String>,
    organization: Option<String>,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    tor: bool,
    #[serde(default, rename = "is_datacenter")]
    is_datacenter: bool,
}
