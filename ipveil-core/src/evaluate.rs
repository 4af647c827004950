//! Pure signal evaluators
//!
//! Each evaluator turns one normalized evidence report into a `SignalResult`,
//! or `None` when the underlying source was unavailable or below its minimum
//! sample count. Absence is never scored as clean; the aggregator simply
//! leaves it out of the denominator.

use cidr::IpCidr;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

use crate::{
    DnsblReport, EvidenceSet, GeoReport, IntelReport, LatencyReport, PortScanReport,
    RdnsReport, ScoringConfig, SignalName, SignalResult, WhoisReport,
};

/// Hostname keywords that mark a PTR record as VPN/proxy infrastructure
const RDNS_KEYWORDS: &[&str] = &["vpn", "proxy", "tor", "exit", "relay"];

/// Weaker hostname patterns typical of datacenter/hosting space
const SUSPICIOUS_HOST_PATTERNS: &[&str] = &[
    r"vps",
    r"dedicated",
    r"cloud",
    r"server\d*\.",
    r"srv\d*\.",
    r"node\d*\.",
    r"amazonaws\.",
    r"googleusercontent\.",
    r"linode",
    r"digitalocean",
    r"vultr",
    r"hetzner",
    r"ovh\.",
    r"contabo",
];

static SUSPICIOUS_HOST_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SUSPICIOUS_HOST_PATTERNS
        .iter()
        .map(|pattern| (*pattern, Regex::new(&format!("(?i){pattern}")).unwrap()))
        .collect()
});

/// WHOIS keywords that alone justify the flat high-risk add
const WHOIS_HIGH_RISK: &[&str] = &["vpn", "proxy", "anonymous"];

/// WHOIS keywords that accumulate per distinct hit
const WHOIS_GENERAL: &[&str] = &[
    "hosting",
    "datacenter",
    "data center",
    "cloud",
    "vps",
    "dedicated",
    "virtual private",
    "servers",
    "infrastructure",
    "colocation",
];

/// CIDR range membership. Curated ground truth, so confidence is 1.0.
pub fn evaluate_cidr(ip: IpAddr, ranges: &[IpCidr], cfg: &ScoringConfig) -> SignalResult {
    let hit = ranges.iter().find(|range| range.contains(&ip));
    match hit {
        Some(range) => SignalResult::new(
            SignalName::CidrCheck,
            true,
            100.0,
            cfg.cidr_weight,
            1.0,
            format!("IP found in known VPN/hosting range {range}"),
        ),
        None => SignalResult::new(
            SignalName::CidrCheck,
            false,
            0.0,
            cfg.cidr_weight,
            1.0,
            "IP not found in known VPN/hosting ranges",
        ),
    }
}

/// Open-port count scaled by a fixed per-port step, capped at 100
pub fn evaluate_ports(report: &PortScanReport, cfg: &ScoringConfig) -> SignalResult {
    let open = report.open_ports();
    let raw = (open.len() as f64 * cfg.points_per_open_port).min(100.0);
    let details = if open.is_empty() {
        "No VPN/tunnel ports open".to_string()
    } else {
        format!("Open VPN/tunnel ports: {open:?}")
    };
    SignalResult::new(
        SignalName::PortScan,
        !open.is_empty(),
        raw,
        cfg.port_scan_weight,
        0.9,
        details,
    )
}

/// PTR keyword match. A missing PTR record is neutral, not suspicious.
pub fn evaluate_rdns(report: &RdnsReport, cfg: &ScoringConfig) -> SignalResult {
    if report.hostnames.is_empty() {
        return SignalResult::new(
            SignalName::ReverseDns,
            false,
            0.0,
            cfg.reverse_dns_weight,
            0.8,
            "No reverse DNS record found",
        );
    }

    // A keyword hit on any hostname wins outright, so exhaust the keyword
    // pass before falling back to the weaker hosting patterns
    for hostname in &report.hostnames {
        let lower = hostname.to_lowercase();
        if let Some(keyword) = RDNS_KEYWORDS.iter().find(|k| lower.contains(**k)) {
            return SignalResult::new(
                SignalName::ReverseDns,
                true,
                100.0,
                cfg.reverse_dns_weight,
                0.8,
                format!("Hostname {hostname} contains keyword \"{keyword}\""),
            );
        }
    }
    for hostname in &report.hostnames {
        for (pattern, re) in SUSPICIOUS_HOST_REGEXES.iter() {
            if re.is_match(hostname) {
                return SignalResult::new(
                    SignalName::ReverseDns,
                    true,
                    cfg.rdns_pattern_score,
                    cfg.reverse_dns_weight,
                    0.8,
                    format!("Hostname {hostname} matches hosting pattern \"{pattern}\""),
                );
            }
        }
    }

    SignalResult::new(
        SignalName::ReverseDns,
        false,
        0.0,
        cfg.reverse_dns_weight,
        0.8,
        format!("Clean hostnames: {}", report.hostnames.join(", ")),
    )
}

/// Two-tier WHOIS keyword scoring: one flat add for any high-risk hit, then a
/// step per distinct general hosting keyword, all capped at the ceiling.
pub fn evaluate_whois(report: &WhoisReport, cfg: &ScoringConfig) -> SignalResult {
    let text: Vec<String> = report.text_fields().map(str::to_lowercase).collect();
    let contains = |keyword: &str| text.iter().any(|t| t.contains(keyword));

    let high_hits: Vec<&str> = WHOIS_HIGH_RISK
        .iter()
        .copied()
        .filter(|k| contains(k))
        .collect();
    let general_hits: Vec<&str> = WHOIS_GENERAL
        .iter()
        .copied()
        .filter(|k| contains(k))
        .collect();

    let mut raw = 0.0;
    if !high_hits.is_empty() {
        raw += cfg.whois_high_risk_bonus;
    }
    raw += general_hits.len() as f64 * cfg.whois_general_step;
    raw = raw.min(cfg.whois_ceiling);

    let details = if high_hits.is_empty() && general_hits.is_empty() {
        "No VPN/hosting keywords in WHOIS organization data".to_string()
    } else {
        let mut matched: Vec<&str> = high_hits.clone();
        matched.extend(&general_hits);
        format!("WHOIS keywords matched: {}", matched.join(", "))
    };

    SignalResult::new(
        SignalName::WhoisCheck,
        raw > 0.0,
        raw,
        cfg.whois_weight,
        0.6,
        details,
    )
}

/// Score proportional to the fraction of blocklists reporting a listing
pub fn evaluate_dnsbl(report: &DnsblReport, cfg: &ScoringConfig) -> Option<SignalResult> {
    if report.checked == 0 {
        return None;
    }
    let raw = report.listed.len() as f64 / report.checked as f64 * 100.0;
    let details = if report.listed.is_empty() {
        format!("Not listed on any of {} blocklists", report.checked)
    } else {
        format!(
            "Listed on {}/{} blocklists: {}",
            report.listed.len(),
            report.checked,
            report.listed.join(", ")
        )
    };
    Some(SignalResult::new(
        SignalName::Dnsbl,
        !report.listed.is_empty(),
        raw,
        cfg.dnsbl_weight,
        0.7,
        details,
    ))
}

/// Country disagreement across sources plus datacenter/hosting flags
pub fn evaluate_geo(report: &GeoReport, cfg: &ScoringConfig) -> Option<SignalResult> {
    if report.source_count == 0 && !report.datacenter_flagged {
        return None;
    }

    let mut distinct: Vec<&str> = report.countries.iter().map(String::as_str).collect();
    distinct.sort_unstable();
    distinct.dedup();
    let mismatch = report.source_count >= 2 && distinct.len() > 1;

    let mut raw = 0.0;
    let mut parts = Vec::new();
    if mismatch {
        raw += cfg.geo_mismatch_score;
        parts.push(format!("Inconsistent location data: {}", distinct.join(", ")));
    }
    if report.datacenter_flagged {
        raw += cfg.geo_datacenter_score;
        match &report.provider {
            Some(provider) => parts.push(format!("Datacenter/hosting provider: {provider}")),
            None => parts.push("Flagged as datacenter/hosting space".to_string()),
        }
    }
    raw = raw.min(100.0);

    let details = if parts.is_empty() {
        format!("Consistent location across {} sources", report.source_count)
    } else {
        parts.join("; ")
    };

    Some(SignalResult::new(
        SignalName::GeoConsistency,
        raw > 0.0,
        raw,
        cfg.geo_weight,
        0.6,
        details,
    ))
}

/// Average of the sub-scores the intelligence providers expose. Mirrors the
/// denominator-per-available-factor approach so missing providers do not
/// drag the score toward zero.
pub fn evaluate_intel(report: &IntelReport, cfg: &ScoringConfig) -> Option<SignalResult> {
    if report.source_count == 0 {
        return None;
    }

    let mut score = 0.0;
    let mut factors = 0u32;

    if let Some(abuse) = report.abuse_confidence {
        score += abuse;
        factors += 1;
    }
    if let Some(fraud) = report.fraud_score {
        score += fraud;
        factors += 1;
    }
    if let Some(risk) = report.proxy_risk {
        score += risk;
        factors += 1;
    }
    if report.is_proxy.is_some() || report.is_hosting.is_some() {
        let mut flag_score: f64 = 0.0;
        if report.is_proxy == Some(true) {
            flag_score += 100.0;
        }
        if report.is_hosting == Some(true) {
            flag_score += 80.0;
        }
        score += flag_score.min(100.0);
        factors += 1;
    }

    let raw = if factors > 0 {
        (score / factors as f64).min(100.0)
    } else {
        0.0
    };

    let flagged = [report.is_proxy, report.is_vpn, report.is_tor, report.is_anonymous]
        .iter()
        .any(|f| *f == Some(true));
    let confidence = (0.5 + 0.1 * report.source_count as f64).min(1.0);

    Some(SignalResult::new(
        SignalName::Intelligence,
        flagged || raw >= 50.0,
        raw,
        cfg.intelligence_weight,
        confidence,
        format!(
            "{} intelligence providers reporting, {} scoring factors",
            report.source_count, factors
        ),
    ))
}

/// Two-band piecewise-linear ramp, continuous at both band boundaries:
/// below suspicious scales 0..50, between the bands 50..100, above high 100.
fn band_score(value: f64, suspicious: f64, high: f64) -> f64 {
    if value >= high {
        100.0
    } else if value >= suspicious {
        50.0 + (value - suspicious) / (high - suspicious) * 50.0
    } else {
        (value / suspicious).max(0.0) * 50.0
    }
}

/// RTT/jitter/packet-loss signal. Absent below the minimum sample count
/// rather than reported as a low-confidence estimate.
pub fn evaluate_latency(report: &LatencyReport, cfg: &ScoringConfig) -> Option<SignalResult> {
    let valid = report.valid_samples();
    if valid.len() < cfg.min_latency_samples {
        return None;
    }

    let rtt = report.rtt_ms()?;
    let jitter = report.jitter_ms()?;
    let loss = report.loss_pct();

    let rtt_score = band_score(rtt, cfg.rtt_suspicious_ms, cfg.rtt_high_ms);
    let jitter_score = band_score(jitter, cfg.jitter_suspicious_ms, cfg.jitter_high_ms);
    let loss_score = band_score(loss, cfg.loss_suspicious_pct, cfg.loss_high_pct);
    let raw = (rtt_score + jitter_score + loss_score) / 3.0;

    let triggered = rtt >= cfg.rtt_suspicious_ms
        || jitter >= cfg.jitter_suspicious_ms
        || loss >= cfg.loss_suspicious_pct;
    let confidence = (valid.len() as f64 / 10.0).min(1.0);

    Some(SignalResult::new(
        SignalName::LinkQuality,
        triggered,
        raw,
        cfg.link_quality_weight,
        confidence,
        format!("rtt {rtt:.1}ms, jitter {jitter:.1}ms, loss {loss:.1}%"),
    ))
}

/// Run every evaluator over the joined evidence, skipping absent sources
pub fn evaluate_all(
    ip: IpAddr,
    evidence: &EvidenceSet,
    ranges: &[IpCidr],
    cfg: &ScoringConfig,
) -> Vec<SignalResult> {
    let mut signals = Vec::new();

    signals.push(evaluate_cidr(ip, ranges, cfg));
    if let Some(ports) = &evidence.ports {
        signals.push(evaluate_ports(ports, cfg));
    }
    if let Some(rdns) = &evidence.rdns {
        signals.push(evaluate_rdns(rdns, cfg));
    }
    if let Some(whois) = &evidence.whois {
        signals.push(evaluate_whois(whois, cfg));
    }
    if let Some(dnsbl) = &evidence.dnsbl {
        signals.extend(evaluate_dnsbl(dnsbl, cfg));
    }
    if let Some(geo) = &evidence.geo {
        signals.extend(evaluate_geo(geo, cfg));
    }
    if let Some(intel) = &evidence.intel {
        signals.extend(evaluate_intel(intel, cfg));
    }
    if let Some(latency) = &evidence.latency {
        signals.extend(evaluate_latency(latency, cfg));
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PortProbe;
    use std::str::FromStr;

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_cidr_hit_is_full_score_full_confidence() {
        let ranges = vec![IpCidr::from_str("185.220.0.0/16").unwrap()];
        let signal = evaluate_cidr(ip("185.220.101.5"), &ranges, &cfg());
        assert!(signal.triggered);
        assert_eq!(signal.raw_score, 100.0);
        assert_eq!(signal.confidence, 1.0);
    }

    #[test]
    fn test_cidr_miss() {
        let ranges = vec![IpCidr::from_str("185.220.0.0/16").unwrap()];
        let signal = evaluate_cidr(ip("8.8.8.8"), &ranges, &cfg());
        assert!(!signal.triggered);
        assert_eq!(signal.raw_score, 0.0);
    }

    #[test]
    fn test_ports_scale_and_cap() {
        let probes = |count: usize| PortScanReport {
            probes: (0..count)
                .map(|i| PortProbe { port: 1000 + i as u16, open: true, latency_ms: 5 })
                .collect(),
        };
        let two = evaluate_ports(&probes(2), &cfg());
        assert!(two.triggered);
        assert_eq!(two.raw_score, 30.0);

        let many = evaluate_ports(&probes(10), &cfg());
        assert_eq!(many.raw_score, 100.0);
    }

    #[test]
    fn test_rdns_keyword_match() {
        let report = RdnsReport {
            hostnames: vec!["exit-node-3.torproject.net".to_string()],
        };
        let signal = evaluate_rdns(&report, &cfg());
        assert!(signal.triggered);
        assert_eq!(signal.raw_score, 100.0);
    }

    #[test]
    fn test_rdns_missing_ptr_is_neutral() {
        let signal = evaluate_rdns(&RdnsReport::default(), &cfg());
        assert!(!signal.triggered);
        assert_eq!(signal.raw_score, 0.0);
        assert!(signal.details.contains("No reverse DNS"));
    }

    #[test]
    fn test_rdns_hosting_pattern_partial_score() {
        let report = RdnsReport {
            hostnames: vec!["ec2-3-85-1-2.compute-1.amazonaws.com".to_string()],
        };
        let signal = evaluate_rdns(&report, &cfg());
        assert!(signal.triggered);
        assert_eq!(signal.raw_score, cfg().rdns_pattern_score);
    }

    #[test]
    fn test_rdns_keyword_on_later_hostname_beats_earlier_pattern() {
        // A keyword anywhere in the PTR set means full score, even when an
        // earlier hostname only matches a weaker hosting pattern
        let report = RdnsReport {
            hostnames: vec![
                "cloud-host.example.com".to_string(),
                "vpn-gw.example.net".to_string(),
            ],
        };
        let signal = evaluate_rdns(&report, &cfg());
        assert_eq!(signal.raw_score, 100.0);
        assert!(signal.details.contains("vpn"));
    }

    #[test]
    fn test_whois_high_risk_applies_once() {
        let report = WhoisReport {
            organization: Some("SuperVPN Anonymous Proxy LLC".to_string()),
            ..Default::default()
        };
        // Three high-risk hits still add the flat bonus once
        let signal = evaluate_whois(&report, &cfg());
        assert!(signal.triggered);
        assert_eq!(signal.raw_score, 30.0);
    }

    #[test]
    fn test_whois_general_keywords_accumulate_to_ceiling() {
        let report = WhoisReport {
            organization: Some("Anonymous Cloud Hosting".to_string()),
            description: Some("datacenter vps dedicated servers infrastructure".to_string()),
            ..Default::default()
        };
        let signal = evaluate_whois(&report, &cfg());
        // 30 flat + 7 general hits * 15 caps at the 90 ceiling
        assert_eq!(signal.raw_score, 90.0);
    }

    #[test]
    fn test_whois_clean() {
        let report = WhoisReport {
            organization: Some("Comcast Cable Communications".to_string()),
            ..Default::default()
        };
        let signal = evaluate_whois(&report, &cfg());
        assert!(!signal.triggered);
        assert_eq!(signal.raw_score, 0.0);
    }

    #[test]
    fn test_dnsbl_fraction() {
        let report = DnsblReport {
            listed: vec!["zen.spamhaus.org".to_string(), "bl.spamcop.net".to_string()],
            checked: 6,
        };
        let signal = evaluate_dnsbl(&report, &cfg()).unwrap();
        assert!(signal.triggered);
        assert!((signal.raw_score - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dnsbl_absent_when_nothing_checked() {
        assert!(evaluate_dnsbl(&DnsblReport::default(), &cfg()).is_none());
    }

    #[test]
    fn test_geo_mismatch_and_datacenter() {
        let report = GeoReport {
            countries: vec!["US".to_string(), "NL".to_string()],
            source_count: 2,
            datacenter_flagged: true,
            provider: Some("DigitalOcean".to_string()),
        };
        let signal = evaluate_geo(&report, &cfg()).unwrap();
        assert!(signal.triggered);
        assert_eq!(signal.raw_score, 90.0);
    }

    #[test]
    fn test_geo_single_source_no_mismatch() {
        let report = GeoReport {
            countries: vec!["US".to_string()],
            source_count: 1,
            ..Default::default()
        };
        let signal = evaluate_geo(&report, &cfg()).unwrap();
        assert!(!signal.triggered);
        assert_eq!(signal.raw_score, 0.0);
    }

    #[test]
    fn test_geo_absent_without_sources() {
        assert!(evaluate_geo(&GeoReport::default(), &cfg()).is_none());
    }

    #[test]
    fn test_intel_factor_average() {
        let report = IntelReport {
            abuse_confidence: Some(80.0),
            fraud_score: Some(60.0),
            is_proxy: Some(true),
            source_count: 3,
            ..Default::default()
        };
        let signal = evaluate_intel(&report, &cfg()).unwrap();
        assert!(signal.triggered);
        // (80 + 60 + 100) / 3
        assert!((signal.raw_score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_intel_absent_without_providers() {
        assert!(evaluate_intel(&IntelReport::default(), &cfg()).is_none());
    }

    #[test]
    fn test_band_score_continuity() {
        let c = cfg();
        // Approaching the suspicious boundary from below meets the band value
        let below = band_score(c.rtt_suspicious_ms - 1e-9, c.rtt_suspicious_ms, c.rtt_high_ms);
        let at = band_score(c.rtt_suspicious_ms, c.rtt_suspicious_ms, c.rtt_high_ms);
        assert!((below - at).abs() < 1e-6);
        assert_eq!(band_score(c.rtt_high_ms, c.rtt_suspicious_ms, c.rtt_high_ms), 100.0);
        // Below-suspicious is proportional, never a hard zero away from origin
        assert!(band_score(50.0, c.rtt_suspicious_ms, c.rtt_high_ms) > 0.0);
    }

    #[test]
    fn test_latency_absent_below_minimum_samples() {
        let report = LatencyReport {
            samples_ms: vec![Some(20.0), Some(25.0), None, None],
        };
        assert!(evaluate_latency(&report, &cfg()).is_none());
    }

    #[test]
    fn test_latency_triggers_on_high_loss() {
        let report = LatencyReport {
            samples_ms: vec![
                Some(20.0),
                Some(21.0),
                Some(19.0),
                Some(20.0),
                None,
                None,
                None,
                None,
            ],
        };
        let signal = evaluate_latency(&report, &cfg()).unwrap();
        assert!(signal.triggered); // 50% loss
    }

    #[test]
    fn test_evaluate_all_skips_absent_sources() {
        let evidence = EvidenceSet {
            rdns: Some(RdnsReport::default()),
            ..Default::default()
        };
        let signals = evaluate_all(ip("8.8.8.8"), &evidence, &[], &cfg());
        // CIDR always evaluates (config is local); rDNS was the only report
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].name, SignalName::CidrCheck);
        assert_eq!(signals[1].name, SignalName::ReverseDns);
    }
}
