//! AbuseIPDB adapter - abuse confidence over a 90-day window

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct AbuseIpdbAdapter {
    client: Client,
    api_key: String,
}

impl AbuseIpdbAdapter {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderAdapter for AbuseIpdbAdapter {
    fn name(&self) -> &'static str {
        "abuseipdb"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let response = match self
            .client
            .get("https://api.abuseipdb.com/api/v2/check")
            .query(&[("ipAddress", ip.to_string()), ("maxAgeInDays", "90".into())])
            .header("Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "abuseipdb request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "abuseipdb returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: AbuseIpdbResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse abuseipdb response");
                return ProviderOutcome::Unavailable;
            }
        };
        let data = body.data;

        ProviderOutcome::Available(IntelRecord {
            source: "abuseipdb",
            country: data.country_code.map(|c| c.to_uppercase()),
            organization: data.isp,
            tor: Some(data.is_tor),
            abuse_confidence: Some(data.abuse_confidence_score),
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct AbuseIpdbResponse {
    data: AbuseIpdbData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbuseIpdbData {
    abuse_confidence_score: f64,
    country_code: Option<String>,
    isp: Option<String>,
    #[serde(default)]
    is_tor: bool,
}
