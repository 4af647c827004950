//! ipinfo.io adapter - geolocation and org, token optional

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct IpInfoAdapter {
    client: Client,
    token: Option<String>,
}

impl IpInfoAdapter {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl ProviderAdapter for IpInfoAdapter {
    fn name(&self) -> &'static str {
        "ipinfo"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let mut request = self.client.get(format!("https://ipinfo.io/{ip}/json"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "ipinfo request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "ipinfo returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: IpInfoResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse ipinfo response");
                return ProviderOutcome::Unavailable;
            }
        };

        ProviderOutcome::Available(IntelRecord {
            source: "ipinfo",
            country: body.country.map(|c| c.to_uppercase()),
            organization: body.org,
            hosting: body.privacy.as_ref().map(|p| p.hosting),
            proxy: body.privacy.as_ref().map(|p| p.proxy),
            vpn: body.privacy.as_ref().map(|p| p.vpn),
            tor: body.privacy.as_ref().map(|p| p.tor),
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    country: Option<String>,
    org: Option<String>,
    /// Only present on paid plans
    privacy: Option<IpInfoPrivacy>,
}

#[derive(Debug, Deserialize)]
struct IpInfoPrivacy {
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    tor: bool,
    #[serde(default)]
    hosting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_free_tier_body() {
        let body: IpInfoResponse = serde_json::from_str(
            r#"{"ip":"8.8.8.8","country":"US","org":"AS15169 Google LLC"}"#,
        )
        .unwrap();
        assert_eq!(body.country.as_deref(), Some("US"));
        assert!(body.privacy.is_none());
    }

    #[test]
    fn test_parse_privacy_block() {
        let body: IpInfoResponse = serde_json::from_str(
            r#"{"country":"NL","org":"M247","privacy":{"vpn":true,"proxy":false,"tor":false,"hosting":true}}"#,
        )
        .unwrap();
        let privacy = body.privacy.unwrap();
        assert!(privacy.vpn);
        assert!(privacy.hosting);
        assert!(!privacy.tor);
    }
}
