//! Merge per-source records into the reports scoring consumes

use ipveil_core::{GeoReport, IntelReport};

use crate::IntelRecord;

/// Fold every available record into a geolocation report and an intelligence
/// report. Either side is `None` when no record contributed to it, which
/// keeps the corresponding signal Absent.
pub fn merge_records(records: &[IntelRecord]) -> (Option<GeoReport>, Option<IntelReport>) {
    (merge_geo(records), merge_intel(records))
}

fn merge_geo(records: &[IntelRecord]) -> Option<GeoReport> {
    let mut countries: Vec<String> = Vec::new();
    let mut source_count = 0;
    let mut datacenter_flagged = false;
    let mut provider: Option<String> = None;

    for record in records {
        if let Some(country) = &record.country {
            source_count += 1;
            if !countries.contains(country) {
                countries.push(country.clone());
            }
        }
        if record.hosting == Some(true) {
            datacenter_flagged = true;
            if provider.is_none() {
                provider = record.organization.clone();
            }
        }
    }

    if source_count == 0 && !datacenter_flagged {
        return None;
    }
    Some(GeoReport {
        countries,
        source_count,
        datacenter_flagged,
        provider,
    })
}

fn merge_intel(records: &[IntelRecord]) -> Option<IntelReport> {
    let contributing: Vec<&IntelRecord> = records.iter().filter(|r| r.has_intel()).collect();
    if contributing.is_empty() {
        return None;
    }

    let or_flags = |pick: fn(&IntelRecord) -> Option<bool>| -> Option<bool> {
        let reported: Vec<bool> = contributing.iter().filter_map(|r| pick(r)).collect();
        if reported.is_empty() {
            None
        } else {
            Some(reported.iter().any(|&b| b))
        }
    };

    Some(IntelReport {
        abuse_confidence: contributing.iter().find_map(|r| r.abuse_confidence),
        fraud_score: contributing.iter().find_map(|r| r.fraud_score),
        proxy_risk: contributing.iter().find_map(|r| r.risk),
        is_proxy: or_flags(|r| r.proxy),
        is_vpn: or_flags(|r| r.vpn),
        is_tor: or_flags(|r| r.tor),
        is_hosting: or_flags(|r| r.hosting),
        is_anonymous: or_flags(|r| r.anonymous),
        source_count: contributing.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &'static str) -> IntelRecord {
        IntelRecord {
            source,
            ..IntelRecord::default()
        }
    }

    #[test]
    fn test_no_records_means_both_absent() {
        let (geo, intel) = merge_records(&[]);
        assert!(geo.is_none());
        assert!(intel.is_none());
    }

    #[test]
    fn test_geo_counts_sources_and_dedups_countries() {
        let records = vec![
            IntelRecord {
                country: Some("US".into()),
                ..record("a")
            },
            IntelRecord {
                country: Some("US".into()),
                ..record("b")
            },
            IntelRecord {
                country: Some("NL".into()),
                ..record("c")
            },
        ];
        let geo = merge_geo(&records).unwrap();
        assert_eq!(geo.source_count, 3);
        assert_eq!(geo.countries, vec!["US".to_string(), "NL".to_string()]);
        assert!(!geo.datacenter_flagged);
    }

    #[test]
    fn test_geo_hosting_flag_carries_provider() {
        let records = vec![IntelRecord {
            country: Some("DE".into()),
            organization: Some("Hetzner Online GmbH".into()),
            hosting: Some(true),
            ..record("a")
        }];
        let geo = merge_geo(&records).unwrap();
        assert!(geo.datacenter_flagged);
        assert_eq!(geo.provider.as_deref(), Some("Hetzner Online GmbH"));
    }

    #[test]
    fn test_intel_flags_or_across_sources() {
        let records = vec![
            IntelRecord {
                proxy: Some(false),
                vpn: Some(false),
                ..record("a")
            },
            IntelRecord {
                proxy: Some(true),
                fraud_score: Some(88.0),
                ..record("b")
            },
        ];
        let intel = merge_intel(&records).unwrap();
        assert_eq!(intel.is_proxy, Some(true));
        assert_eq!(intel.is_vpn, Some(false));
        assert_eq!(intel.is_tor, None);
        assert_eq!(intel.fraud_score, Some(88.0));
        assert_eq!(intel.source_count, 2);
    }

    #[test]
    fn test_geo_only_record_does_not_fill_intel() {
        let records = vec![IntelRecord {
            country: Some("US".into()),
            ..record("a")
        }];
        let (geo, intel) = merge_records(&records);
        assert!(geo.is_some());
        assert!(intel.is_none());
    }
}
