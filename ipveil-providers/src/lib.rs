//! ipveil Providers - third-party intelligence and geolocation adapters
//!
//! Each adapter normalizes one upstream API into an [`IntelRecord`]. Adapters
//! fail open: a missing key, a timeout, or an unparseable body all come back
//! as [`ProviderOutcome::Unavailable`] so the detection run degrades instead
//! of erroring.

pub mod abuseipdb;
pub mod ipapi;
pub mod ipinfo;
pub mod ipqs;
pub mod maxmind;
pub mod merge;
pub mod proxycheck;

pub use abuseipdb::AbuseIpdbAdapter;
pub use ipapi::IpApiAdapter;
pub use ipinfo::IpInfoAdapter;
pub use ipqs::IpqsAdapter;
pub use maxmind::MaxMindAdapter;
pub use merge::merge_records;
pub use proxycheck::ProxyCheckAdapter;

use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

/// Normalized fields from one upstream source. Every field is optional;
/// sources only fill what they actually report.
#[derive(Debug, Clone, Default)]
pub struct IntelRecord {
    /// Adapter that produced the record
    pub source: &'static str,
    /// ISO country code, uppercased
    pub country: Option<String>,
    /// Owning organization or ISP string
    pub organization: Option<String>,
    pub hosting: Option<bool>,
    pub proxy: Option<bool>,
    pub vpn: Option<bool>,
    pub tor: Option<bool>,
    pub anonymous: Option<bool>,
    /// AbuseIPDB abuse confidence, 0-100
    pub abuse_confidence: Option<f64>,
    /// IPQualityScore fraud score, 0-100
    pub fraud_score: Option<f64>,
    /// ProxyCheck risk, 0-100
    pub risk: Option<f64>,
}

impl IntelRecord {
    /// Whether the record carries anything beyond its source name
    pub fn has_intel(&self) -> bool {
        self.hosting.is_some()
            || self.proxy.is_some()
            || self.vpn.is_some()
            || self.tor.is_some()
            || self.anonymous.is_some()
            || self.abuse_confidence.is_some()
            || self.fraud_score.is_some()
            || self.risk.is_some()
    }
}

/// Outcome of one provider query
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    Available(IntelRecord),
    /// Key missing, request failed, or response unparseable
    Unavailable,
}

/// One upstream intelligence or geolocation source
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Query the upstream for one address. Never errors; degraded sources
    /// report [`ProviderOutcome::Unavailable`].
    async fn fetch(&self, ip: IpAddr) -> ProviderOutcome;
}

/// API keys and tunables shared by all adapters
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub abuseipdb_key: Option<String>,
    pub ipqs_key: Option<String>,
    pub proxycheck_key: Option<String>,
    pub maxmind_key: Option<String>,
    pub ipinfo_token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            abuseipdb_key: std::env::var("ABUSEIPDB_API_KEY").ok(),
            ipqs_key: std::env::var("IPQUALITYSCORE_API_KEY").ok(),
            proxycheck_key: std::env::var("PROXYCHECK_API_KEY").ok(),
            maxmind_key: std::env::var("MAXMIND_API_KEY").ok(),
            ipinfo_token: std::env::var("IPINFO_TOKEN").ok(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ProviderConfig {
    /// Shared HTTP client honoring the configured timeout
    pub fn build_client(&self) -> Client {
        Client::builder()
            .timeout(self.request_timeout)
            .build()
            .unwrap_or_default()
    }
}

/// Build every adapter the configuration has credentials for. Keyless
/// sources are always included.
pub fn default_adapters(config: &ProviderConfig) -> Vec<Box<dyn ProviderAdapter>> {
    let client = config.build_client();
    let mut adapters: Vec<Box<dyn ProviderAdapter>> = vec![
        Box::new(IpApiAdapter::new(client.clone())),
        Box::new(IpInfoAdapter::new(client.clone(), config.ipinfo_token.clone())),
    ];
    if let Some(key) = &config.abuseipdb_key {
        adapters.push(Box::new(AbuseIpdbAdapter::new(client.clone(), key.clone())));
    }
    if let Some(key) = &config.ipqs_key {
        adapters.push(Box::new(IpqsAdapter::new(client.clone(), key.clone())));
    }
    if let Some(key) = &config.proxycheck_key {
        adapters.push(Box::new(ProxyCheckAdapter::new(client.clone(), key.clone())));
    }
    if let Some(key) = &config.maxmind_key {
        adapters.push(Box::new(MaxMindAdapter::new(client, key.clone())));
    }
    adapters
}

/// Query every adapter concurrently and keep what answered
pub async fn fetch_all(adapters: &[Box<dyn ProviderAdapter>], ip: IpAddr) -> Vec<IntelRecord> {
    let queries = adapters.iter().map(|a| a.fetch(ip));
    futures::future::join_all(queries)
        .await
        .into_iter()
        .filter_map(|outcome| match outcome {
            ProviderOutcome::Available(record) => Some(record),
            ProviderOutcome::Unavailable => None,
        })
        .collect()
}
