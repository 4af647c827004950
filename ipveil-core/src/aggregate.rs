//! Verdict aggregation
//!
//! Combines all available signals into one `VerdictResult` using a
//! weight-normalized average, so the score stays calibrated the same way
//! whether three or eight signals fired. Absent signals never reach this
//! function and therefore never count as clean.

use chrono::Utc;
use std::net::IpAddr;
use tracing::error;

use crate::{
    Anomaly, ScoringConfig, Severity, SignalResult, Verdict, VerdictResult, INSUFFICIENT_DATA,
};

/// Clamp an out-of-range signal field. Out-of-range values are programming
/// errors in an evaluator: fail fast under debug, log loudly in release.
fn sanitize(value: f64, lo: f64, hi: f64, label: &str, signal: &SignalResult) -> f64 {
    debug_assert!(
        (lo..=hi).contains(&value),
        "{label} out of [{lo}, {hi}] for {}: {value}",
        signal.name.as_str()
    );
    if !(lo..=hi).contains(&value) {
        error!(
            signal = signal.name.as_str(),
            %value,
            "{label} out of range [{lo}, {hi}], clamping"
        );
        value.clamp(lo, hi)
    } else {
        value
    }
}

/// Combine available signals into the final verdict.
///
/// Deterministic over the signal set and commutative under reordering:
/// only the order of the `signals` field follows the input.
pub fn aggregate(ip: IpAddr, signals: Vec<SignalResult>, cfg: &ScoringConfig) -> VerdictResult {
    let mut weight_sum = 0.0;
    let mut contribution = 0.0;
    let mut confidence_sum = 0.0;
    let mut triggered_count = 0usize;

    for signal in &signals {
        let raw = sanitize(signal.raw_score, 0.0, 100.0, "raw_score", signal);
        let weight = sanitize(signal.weight, 0.0, 1.0, "weight", signal);
        let confidence = sanitize(signal.confidence, 0.0, 1.0, "confidence", signal);

        weight_sum += weight;
        contribution += raw * weight;
        confidence_sum += confidence * weight;
        if signal.triggered {
            triggered_count += 1;
        }
    }

    if weight_sum == 0.0 {
        // All signals absent: report honestly instead of fabricating a verdict
        return VerdictResult {
            ip,
            score: 0,
            verdict: Verdict::Original,
            confidence: 0,
            signals,
            anomalies: vec![Anomaly {
                kind: INSUFFICIENT_DATA.to_string(),
                severity: Severity::High,
                details: "No signal source was available for this IP".to_string(),
            }],
            timestamp: Utc::now(),
        };
    }

    let mut score = contribution / weight_sum;

    // Independent corroboration is stronger evidence than the weighted
    // average alone suggests
    if triggered_count >= 3 {
        score += cfg.triple_confirmation_bonus;
    } else if triggered_count == 2 {
        score += cfg.double_confirmation_bonus;
    }
    // Round before thresholding so the verdict always agrees with the
    // reported integer score
    let score = score.clamp(0.0, 100.0).round();

    let confidence = (confidence_sum / weight_sum * 100.0).clamp(0.0, 100.0);

    let verdict = if score >= cfg.threshold {
        Verdict::ProxyVpn
    } else {
        Verdict::Original
    };

    let mut anomalies: Vec<Anomaly> = Vec::new();
    for signal in &signals {
        let severity = signal.severity();
        if signal.triggered && severity >= Severity::Medium {
            let kind = signal.name.as_str().to_string();
            if !anomalies.iter().any(|a| a.kind == kind) {
                anomalies.push(Anomaly {
                    kind,
                    severity,
                    details: signal.details.clone(),
                });
            }
        }
    }

    VerdictResult {
        ip,
        score: score as u8,
        verdict,
        confidence: confidence.round() as u8,
        signals,
        anomalies,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalName;

    fn cfg() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn ip() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    fn signal(
        name: SignalName,
        triggered: bool,
        raw: f64,
        weight: f64,
        confidence: f64,
    ) -> SignalResult {
        SignalResult::new(name, triggered, raw, weight, confidence, "test")
    }

    #[test]
    fn test_scenario_cidr_hit_alone() {
        let signals = vec![signal(SignalName::CidrCheck, true, 100.0, 0.4, 1.0)];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.score, 100);
        assert_eq!(result.verdict, Verdict::ProxyVpn);
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_scenario_weak_single_signal() {
        let signals = vec![signal(SignalName::WhoisCheck, true, 30.0, 0.2, 0.6)];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.score, 30);
        assert_eq!(result.verdict, Verdict::Original);
    }

    #[test]
    fn test_scenario_triple_confirmation_boost() {
        let signals = vec![
            signal(SignalName::CidrCheck, true, 60.0, 0.2, 0.9),
            signal(SignalName::PortScan, true, 60.0, 0.2, 0.9),
            signal(SignalName::Intelligence, true, 60.0, 0.2, 0.9),
        ];
        let result = aggregate(ip(), signals, &cfg());
        // weighted average 60 plus the +15 triple bonus
        assert_eq!(result.score, 75);
        assert_eq!(result.verdict, Verdict::ProxyVpn);
    }

    #[test]
    fn test_double_confirmation_boost() {
        let signals = vec![
            signal(SignalName::PortScan, true, 40.0, 0.25, 0.9),
            signal(SignalName::Dnsbl, true, 40.0, 0.25, 0.7),
        ];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.score, 47);
    }

    #[test]
    fn test_scenario_total_outage() {
        let result = aggregate(ip(), Vec::new(), &cfg());
        assert_eq!(result.score, 0);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.verdict, Verdict::Original);
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].kind, INSUFFICIENT_DATA);
    }

    #[test]
    fn test_commutativity() {
        let a = signal(SignalName::CidrCheck, true, 100.0, 0.4, 1.0);
        let b = signal(SignalName::WhoisCheck, true, 45.0, 0.2, 0.6);
        let c = signal(SignalName::ReverseDns, false, 0.0, 0.2, 0.8);

        let orderings = [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), a.clone(), b.clone()],
            vec![b.clone(), c.clone(), a.clone()],
        ];
        let first = aggregate(ip(), orderings[0].clone(), &cfg());
        for ordering in &orderings[1..] {
            let result = aggregate(ip(), ordering.clone(), &cfg());
            assert_eq!(result.score, first.score);
            assert_eq!(result.verdict, first.verdict);
            assert_eq!(result.confidence, first.confidence);
        }
    }

    #[test]
    fn test_determinism() {
        let signals = vec![
            signal(SignalName::PortScan, true, 55.0, 0.25, 0.9),
            signal(SignalName::Dnsbl, false, 0.0, 0.25, 0.7),
        ];
        let first = aggregate(ip(), signals.clone(), &cfg());
        let second = aggregate(ip(), signals, &cfg());
        assert_eq!(first.score, second.score);
        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.anomalies, second.anomalies);
    }

    #[test]
    fn test_boundedness() {
        let signals = vec![
            signal(SignalName::CidrCheck, true, 100.0, 1.0, 1.0),
            signal(SignalName::PortScan, true, 100.0, 1.0, 1.0),
            signal(SignalName::Intelligence, true, 100.0, 1.0, 1.0),
            signal(SignalName::Dnsbl, true, 100.0, 1.0, 1.0),
        ];
        let result = aggregate(ip(), signals, &cfg());
        assert!(result.score <= 100);
        assert!(result.confidence <= 100);
    }

    #[test]
    fn test_monotonicity() {
        let base = vec![
            signal(SignalName::PortScan, true, 30.0, 0.25, 0.9),
            signal(SignalName::WhoisCheck, true, 45.0, 0.2, 0.6),
        ];
        let mut previous = aggregate(ip(), base.clone(), &cfg()).score;
        for raw in [40.0, 60.0, 80.0, 100.0] {
            let mut signals = base.clone();
            signals[0].raw_score = raw;
            let score = aggregate(ip(), signals, &cfg()).score;
            assert!(score >= previous, "score decreased when raw_score rose");
            previous = score;
        }
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        let at = vec![signal(SignalName::Intelligence, true, 50.0, 0.35, 0.8)];
        assert_eq!(aggregate(ip(), at, &cfg()).verdict, Verdict::ProxyVpn);

        let below = vec![signal(SignalName::Intelligence, true, 49.4, 0.35, 0.8)];
        assert_eq!(aggregate(ip(), below, &cfg()).verdict, Verdict::Original);
    }

    #[test]
    fn test_verdict_agrees_with_reported_score() {
        // A raw score that rounds up to the threshold must flip the verdict;
        // the reported integer score and the verdict can never disagree
        let signals = vec![signal(SignalName::Intelligence, true, 49.7, 0.35, 0.8)];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.score, 50);
        assert_eq!(result.verdict, Verdict::ProxyVpn);

        let signals = vec![signal(SignalName::Intelligence, true, 49.4, 0.35, 0.8)];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.score, 49);
        assert_eq!(result.verdict, Verdict::Original);
    }

    #[test]
    fn test_confidence_is_weighted_over_signal_confidence() {
        // Same raw scores, different confidence mixes must differ in
        // aggregate confidence, not in score
        let high = vec![
            signal(SignalName::CidrCheck, false, 0.0, 0.4, 1.0),
            signal(SignalName::Dnsbl, false, 0.0, 0.4, 1.0),
        ];
        let low = vec![
            signal(SignalName::CidrCheck, false, 0.0, 0.4, 1.0),
            signal(SignalName::Dnsbl, false, 0.0, 0.4, 0.2),
        ];
        let high_result = aggregate(ip(), high, &cfg());
        let low_result = aggregate(ip(), low, &cfg());
        assert_eq!(high_result.score, low_result.score);
        assert!(high_result.confidence > low_result.confidence);
    }

    #[test]
    fn test_anomalies_from_medium_and_high_triggered_signals() {
        let signals = vec![
            signal(SignalName::CidrCheck, true, 100.0, 0.4, 1.0), // high
            signal(SignalName::WhoisCheck, true, 45.0, 0.2, 0.6), // medium
            signal(SignalName::PortScan, true, 15.0, 0.25, 0.9),  // low, excluded
            signal(SignalName::Dnsbl, false, 80.0, 0.25, 0.7),    // not triggered
        ];
        let result = aggregate(ip(), signals, &cfg());
        let kinds: Vec<&str> = result.anomalies.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["CIDR_CHECK", "WHOIS_CHECK"]);
        assert_eq!(result.anomalies[0].severity, Severity::High);
        assert_eq!(result.anomalies[1].severity, Severity::Medium);
    }

    #[test]
    fn test_signal_order_preserved_in_output() {
        let signals = vec![
            signal(SignalName::WhoisCheck, false, 0.0, 0.2, 0.6),
            signal(SignalName::CidrCheck, false, 0.0, 0.4, 1.0),
        ];
        let result = aggregate(ip(), signals, &cfg());
        assert_eq!(result.signals[0].name, SignalName::WhoisCheck);
        assert_eq!(result.signals[1].name, SignalName::CidrCheck);
    }

    #[test]
    fn test_absence_neutrality() {
        use crate::{evaluate_all, EvidenceSet, RdnsReport};

        // The same available report with and without additional absent
        // sources must aggregate identically
        let only_rdns = EvidenceSet {
            rdns: Some(RdnsReport {
                hostnames: vec!["vpn-gw-2.example.net".to_string()],
            }),
            ..Default::default()
        };
        let with_absent_rest = EvidenceSet {
            rdns: only_rdns.rdns.clone(),
            ports: None,
            whois: None,
            dnsbl: None,
            geo: None,
            latency: None,
            intel: None,
        };

        let cfg = cfg();
        let a = aggregate(ip(), evaluate_all(ip(), &only_rdns, &[], &cfg), &cfg);
        let b = aggregate(ip(), evaluate_all(ip(), &with_absent_rest, &[], &cfg), &cfg);
        assert_eq!(a.score, b.score);
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.confidence, b.confidence);
    }
}
