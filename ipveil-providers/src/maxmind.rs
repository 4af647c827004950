//! MaxMind GeoIP2 Insights adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct MaxMindAdapter {
    client: Client,
    license_key: String,
}

impl MaxMindAdapter {
    pub fn new(client: Client, license_key: String) -> Self {
        Self { client, license_key }
    }
}

#[async_trait]
impl ProviderAdapter for MaxMindAdapter {
    fn name(&self) -> &'static str {
        "maxmind"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let url = format!("https://geoip.maxmind.com/geoip/v2.1/insights/{ip}");
        let response = match self
            .client
            .get(&url)
            .basic_auth("user", Some(&self.license_key))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "maxmind request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "maxmind returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: MaxMindResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse maxmind response");
                return ProviderOutcome::Unavailable;
            }
        };

        let traits = body.traits.unwrap_or_default();
        ProviderOutcome::Available(IntelRecord {
            source: "maxmind",
            country: body.country.and_then(|c| c.iso_code).map(|c| c.to_uppercase()),
            organization: traits.organization.or(traits.isp),
            hosting: Some(traits.user_type.as_deref() == Some("hosting")),
            proxy: Some(traits.is_public_proxy),
            anonymous: Some(traits.is_anonymous),
            vpn: Some(traits.is_anonymous_vpn),
            tor: Some(traits.is_tor_exit_node),
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct MaxMindResponse {
    country: Option<MaxMindCountry>,
    traits: Option<MaxMindTraits>,
}

#[derive(Debug, Deserialize)]
struct MaxMindCountry {
    iso_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MaxMindTraits {
    isp: Option<String>,
    organization: Option<String>,
    user_type: Option<String>,
    #[serde(default)]
    is_anonymous: bool,
    #[serde(default)]
    is_anonymous_vpn: bool,
    #[serde(default)]
    is_public_proxy: bool,
    #[serde(default)]
    is_tor_exit_node: bool,
}
