//! Signal and verdict types
//!
//! A `SignalResult` is the output of one evaluator over one source of evidence.
//! The aggregator folds all available signals into a single `VerdictResult`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Identifiers for the signal sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalName {
    CidrCheck,
    PortScan,
    ReverseDns,
    WhoisCheck,
    Dnsbl,
    GeoConsistency,
    Intelligence,
    LinkQuality,
}

impl SignalName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::CidrCheck => "CIDR_CHECK",
            SignalName::PortScan => "PORT_SCAN",
            SignalName::ReverseDns => "REVERSE_DNS",
            SignalName::WhoisCheck => "WHOIS_CHECK",
            SignalName::Dnsbl => "DNSBL",
            SignalName::GeoConsistency => "GEO_CONSISTENCY",
            SignalName::Intelligence => "INTELLIGENCE",
            SignalName::LinkQuality => "LINK_QUALITY",
        }
    }
}

/// Severity band derived from a raw score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Band a 0-100 raw score: low below 30, high above 70, medium between
    pub fn from_score(raw_score: f64) -> Self {
        if raw_score > 70.0 {
            Severity::High
        } else if raw_score >= 30.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Output of one signal evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    /// Which evaluator produced this
    pub name: SignalName,

    /// Whether this signal indicates VPN/proxy likelihood
    pub triggered: bool,

    /// Normalized severity, 0-100, regardless of provider-specific scale
    pub raw_score: f64,

    /// Static per-signal importance, 0-1
    pub weight: f64,

    /// How much to trust this signal's presence, 0-1
    pub confidence: f64,

    /// Human-readable explanation
    pub details: String,
}

impl SignalResult {
    pub fn new(
        name: SignalName,
        triggered: bool,
        raw_score: f64,
        weight: f64,
        confidence: f64,
        details: impl Into<String>,
    ) -> Self {
        Self {
            name,
            triggered,
            raw_score,
            weight,
            confidence,
            details: details.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_score(self.raw_score)
    }
}

/// Final classification of an IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "PROXY_VPN")]
    ProxyVpn,
    #[serde(rename = "ORIGINAL")]
    Original,
}

/// Distinct anomaly descriptor surfaced for operator review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Stable code, e.g. "REVERSE_DNS" or "INSUFFICIENT_DATA"
    pub kind: String,
    pub severity: Severity,
    pub details: String,
}

/// Anomaly kind emitted when every signal was absent
pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";

/// The aggregate detection output for one IP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictResult {
    pub ip: IpAddr,

    /// Final weighted severity, 0-100
    pub score: u8,

    pub verdict: Verdict,

    /// Aggregate confidence across contributing signals, 0-100
    pub confidence: u8,

    /// Contributing signals in evaluation order
    pub signals: Vec<SignalResult>,

    /// Distinct severity-tagged anomalies, separate from the score
    pub anomalies: Vec<Anomaly>,

    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_score(0.0), Severity::Low);
        assert_eq!(Severity::from_score(29.9), Severity::Low);
        assert_eq!(Severity::from_score(30.0), Severity::Medium);
        assert_eq!(Severity::from_score(70.0), Severity::Medium);
        assert_eq!(Severity::from_score(70.1), Severity::High);
        assert_eq!(Severity::from_score(100.0), Severity::High);
    }

    #[test]
    fn test_signal_name_serialization() {
        let json = serde_json::to_string(&SignalName::CidrCheck).unwrap();
        assert_eq!(json, "\"CIDR_CHECK\"");
        let json = serde_json::to_string(&SignalName::Dnsbl).unwrap();
        assert_eq!(json, "\"DNSBL\"");
        let json = serde_json::to_string(&SignalName::ReverseDns).unwrap();
        assert_eq!(json, "\"REVERSE_DNS\"");
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(
            serde_json::to_string(&Verdict::ProxyVpn).unwrap(),
            "\"PROXY_VPN\""
        );
        assert_eq!(
            serde_json::to_string(&Verdict::Original).unwrap(),
            "\"ORIGINAL\""
        );
    }
}
