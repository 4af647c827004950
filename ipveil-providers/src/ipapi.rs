//! ip-api.com adapter - keyless geolocation with proxy/hosting flags

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::debug;

use crate::{IntelRecord, ProviderAdapter, ProviderOutcome};

pub struct IpApiAdapter {
    client: Client,
}

impl IpApiAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for IpApiAdapter {
    fn name(&self) -> &'static str {
        "ip-api"
    }

    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome {
        let url = format!(
            "http://ip-api.com/json/{ip}?fields=status,message,countryCode,isp,org,proxy,hosting"
        );
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%ip, error = %e, "ip-api request failed");
                return ProviderOutcome::Unavailable;
            }
        };
        if !response.status().is_success() {
            debug!(%ip, status = %response.status(), "ip-api returned error status");
            return ProviderOutcome::Unavailable;
        }
        let body: IpApiResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(%ip, error = %e, "failed to parse ip-api response");
                return ProviderOutcome::Unavailable;
            }
        };
        if body.status != "success" {
            debug!(%ip, message = ?body.message, "ip-api lookup failed");
            return ProviderOutcome::Unavailable;
        }

        ProviderOutcome::Available(IntelRecord {
            source: "ip-api",
            country: body.country_code.map(|c| c.to_uppercase()),
            organization: body.org.or(body.isp),
            hosting: Some(body.hosting),
            proxy: Some(body.proxy),
            ..IntelRecord::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_body() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{"status":"success","countryCode":"de","isp":"Hetzner Online GmbH","org":"Hetzner","proxy":false,"hosting":true}"#,
        )
        .unwrap();
        assert_eq!(body.status, "success");
        assert!(body.hosting);
        assert!(!body.proxy);
        assert_eq!(body.country_code.as_deref(), Some("de"));
    }

    #[test]
    fn test_parse_failure_body() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{"status":"fail","message":"private range"}"#,
        )
        .unwrap();
        assert_eq!(body.status, "fail");
        assert_eq!(body.message.as_deref(), Some("private range"));
    }
}
