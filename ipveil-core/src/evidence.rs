//! Normalized evidence reports
//!
//! The gathering layers (probes, DNS, WHOIS, intelligence providers) each
//! produce one report type here, or nothing when the source was unavailable.
//! Evaluators only ever see these normalized shapes, never raw provider
//! payloads.

use serde::{Deserialize, Serialize};

/// Result of probing one TCP port
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortProbe {
    pub port: u16,
    pub open: bool,
    pub latency_ms: u64,
}

/// All port probes for one detection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortScanReport {
    pub probes: Vec<PortProbe>,
}

impl PortScanReport {
    pub fn open_ports(&self) -> Vec<u16> {
        self.probes.iter().filter(|p| p.open).map(|p| p.port).collect()
    }
}

/// PTR hostnames for the IP. An empty list means the lookup succeeded but no
/// record exists, which is neutral; an unavailable resolver yields no report
/// at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RdnsReport {
    pub hostnames: Vec<String>,
}

/// Parsed registry WHOIS fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhoisReport {
    pub organization: Option<String>,
    pub netname: Option<String>,
    pub description: Option<String>,
    pub asn: Option<String>,
    pub country: Option<String>,
}

impl WhoisReport {
    /// All free-text fields worth scanning for keywords
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.organization
            .as_deref()
            .into_iter()
            .chain(self.netname.as_deref())
            .chain(self.description.as_deref())
    }
}

/// DNSBL query outcome across the configured blocklists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsblReport {
    /// Blocklist domains that returned a listing
    pub listed: Vec<String>,
    /// Number of blocklists actually queried
    pub checked: usize,
}

/// Country reports and hosting flags merged across geolocation sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoReport {
    /// Distinct country codes, one per reporting source
    pub countries: Vec<String>,
    /// Number of sources that reported a country
    pub source_count: usize,
    /// Any provider flagged the IP as datacenter/hosting space
    pub datacenter_flagged: bool,
    /// Organization string behind the flag, when known
    pub provider: Option<String>,
}

/// Round-trip samples; a lost probe is recorded as `None`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyReport {
    pub samples_ms: Vec<Option<f64>>,
}

impl LatencyReport {
    pub fn valid_samples(&self) -> Vec<f64> {
        self.samples_ms.iter().filter_map(|s| *s).collect()
    }

    /// Mean round-trip time over valid samples
    pub fn rtt_ms(&self) -> Option<f64> {
        let valid = self.valid_samples();
        if valid.is_empty() {
            return None;
        }
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    }

    /// Standard deviation of valid samples around the mean
    pub fn jitter_ms(&self) -> Option<f64> {
        let valid = self.valid_samples();
        let mean = self.rtt_ms()?;
        let variance =
            valid.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / valid.len() as f64;
        Some(variance.sqrt())
    }

    /// Share of lost probes, 0-100
    pub fn loss_pct(&self) -> f64 {
        if self.samples_ms.is_empty() {
            return 0.0;
        }
        let lost = self.samples_ms.iter().filter(|s| s.is_none()).count();
        lost as f64 / self.samples_ms.len() as f64 * 100.0
    }
}

/// Merged third-party intelligence fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelReport {
    /// AbuseIPDB abuse confidence, 0-100
    pub abuse_confidence: Option<f64>,
    /// IPQualityScore fraud score, 0-100
    pub fraud_score: Option<f64>,
    /// ProxyCheck risk, 0-100
    pub proxy_risk: Option<f64>,
    pub is_proxy: Option<bool>,
    pub is_vpn: Option<bool>,
    pub is_tor: Option<bool>,
    pub is_hosting: Option<bool>,
    pub is_anonymous: Option<bool>,
    /// Number of providers that contributed
    pub source_count: usize,
}

/// Everything gathered for one detection run, joined after fan-out.
/// `None` means the source was unavailable and its signal must be Absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    pub ports: Option<PortScanReport>,
    pub rdns: Option<RdnsReport>,
    pub whois: Option<WhoisReport>,
    pub dnsbl: Option<DnsblReport>,
    pub geo: Option<GeoReport>,
    pub latency: Option<LatencyReport>,
    pub intel: Option<IntelReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_stats() {
        let report = LatencyReport {
            samples_ms: vec![Some(10.0), Some(20.0), Some(30.0), None],
        };
        assert_eq!(report.valid_samples().len(), 3);
        assert!((report.rtt_ms().unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(report.loss_pct(), 25.0);
        // stddev of [10, 20, 30] around 20 = sqrt(200/3)
        assert!((report.jitter_ms().unwrap() - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_latency_all_lost() {
        let report = LatencyReport {
            samples_ms: vec![None, None],
        };
        assert!(report.rtt_ms().is_none());
        assert!(report.jitter_ms().is_none());
        assert_eq!(report.loss_pct(), 100.0);
    }

    #[test]
    fn test_open_ports() {
        let report = PortScanReport {
            probes: vec![
                PortProbe { port: 1194, open: true, latency_ms: 12 },
                PortProbe { port: 1723, open: false, latency_ms: 500 },
            ],
        };
        assert_eq!(report.open_ports(), vec![1194]);
    }
}
