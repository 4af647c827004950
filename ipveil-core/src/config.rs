//! Consolidated scoring configuration
//!
//! Every weight, threshold, and band lives here as one named field. The
//! aggregator and evaluators take this by reference; nothing in the scoring
//! path carries its own literals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SignalName;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight for {0} out of range [0, 1]: {1}")]
    WeightOutOfRange(&'static str, f64),

    #[error("verdict threshold out of range [0, 100]: {0}")]
    ThresholdOutOfRange(f64),

    #[error("band misordered: {0}")]
    BandMisordered(&'static str),
}

/// All scoring knobs in one place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Score at or above which the verdict flips to PROXY_VPN
    pub threshold: f64,

    /// Weight of the CIDR range membership signal (curated ground truth)
    pub cidr_weight: f64,
    /// Weight of the open-port probe signal
    pub port_scan_weight: f64,
    /// Weight of the reverse-DNS keyword signal
    pub reverse_dns_weight: f64,
    /// Weight of the WHOIS organization keyword signal
    pub whois_weight: f64,
    /// Weight of the DNSBL listing signal
    pub dnsbl_weight: f64,
    /// Weight of the geographic consistency signal
    pub geo_weight: f64,
    /// Weight of the third-party intelligence signal
    pub intelligence_weight: f64,
    /// Weight of the latency/jitter/packet-loss signal
    pub link_quality_weight: f64,

    /// Bonus when three or more independent signals trigger together
    pub triple_confirmation_bonus: f64,
    /// Bonus when exactly two independent signals trigger together
    pub double_confirmation_bonus: f64,

    /// Points added per open VPN/tunnel port, capped at 100
    pub points_per_open_port: f64,

    /// Flat WHOIS add for a high-risk keyword hit, applied once
    pub whois_high_risk_bonus: f64,
    /// WHOIS add per distinct general hosting keyword hit
    pub whois_general_step: f64,
    /// Ceiling for the combined WHOIS keyword score
    pub whois_ceiling: f64,

    /// Partial score for a suspicious (non-keyword) rDNS pattern match
    pub rdns_pattern_score: f64,

    /// Score added on a country mismatch across >= 2 geo sources
    pub geo_mismatch_score: f64,
    /// Score added when intelligence providers flag datacenter/hosting
    pub geo_datacenter_score: f64,

    /// Minimum valid RTT samples before the link signal is usable
    pub min_latency_samples: usize,
    /// RTT bands in milliseconds (suspicious / high)
    pub rtt_suspicious_ms: f64,
    pub rtt_high_ms: f64,
    /// Jitter bands in milliseconds
    pub jitter_suspicious_ms: f64,
    pub jitter_high_ms: f64,
    /// Packet loss bands in percent
    pub loss_suspicious_pct: f64,
    pub loss_high_pct: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: 50.0,

            cidr_weight: 0.40,
            port_scan_weight: 0.25,
            reverse_dns_weight: 0.20,
            whois_weight: 0.20,
            dnsbl_weight: 0.25,
            geo_weight: 0.15,
            intelligence_weight: 0.35,
            link_quality_weight: 0.20,

            triple_confirmation_bonus: 15.0,
            double_confirmation_bonus: 7.0,

            points_per_open_port: 15.0,

            whois_high_risk_bonus: 30.0,
            whois_general_step: 15.0,
            whois_ceiling: 90.0,

            rdns_pattern_score: 60.0,

            geo_mismatch_score: 50.0,
            geo_datacenter_score: 40.0,

            min_latency_samples: 3,
            rtt_suspicious_ms: 100.0,
            rtt_high_ms: 200.0,
            jitter_suspicious_ms: 20.0,
            jitter_high_ms: 50.0,
            loss_suspicious_pct: 5.0,
            loss_high_pct: 10.0,
        }
    }
}

impl ScoringConfig {
    /// Static weight assigned to a signal
    pub fn weight_for(&self, name: SignalName) -> f64 {
        match name {
            SignalName::CidrCheck => self.cidr_weight,
            SignalName::PortScan => self.port_scan_weight,
            SignalName::ReverseDns => self.reverse_dns_weight,
            SignalName::WhoisCheck => self.whois_weight,
            SignalName::Dnsbl => self.dnsbl_weight,
            SignalName::GeoConsistency => self.geo_weight,
            SignalName::Intelligence => self.intelligence_weight,
            SignalName::LinkQuality => self.link_quality_weight,
        }
    }

    /// Fail fast on misconfiguration before serving any detection
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("cidr_weight", self.cidr_weight),
            ("port_scan_weight", self.port_scan_weight),
            ("reverse_dns_weight", self.reverse_dns_weight),
            ("whois_weight", self.whois_weight),
            ("dnsbl_weight", self.dnsbl_weight),
            ("geo_weight", self.geo_weight),
            ("intelligence_weight", self.intelligence_weight),
            ("link_quality_weight", self.link_quality_weight),
        ];
        for (label, w) in weights {
            if !(0.0..=1.0).contains(&w) {
                return Err(ConfigError::WeightOutOfRange(label, w));
            }
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if self.rtt_suspicious_ms >= self.rtt_high_ms {
            return Err(ConfigError::BandMisordered("rtt"));
        }
        if self.jitter_suspicious_ms >= self.jitter_high_ms {
            return Err(ConfigError::BandMisordered("jitter"));
        }
        if self.loss_suspicious_pct >= self.loss_high_pct {
            return Err(ConfigError::BandMisordered("loss"));
        }
        Ok(())
    }
}
