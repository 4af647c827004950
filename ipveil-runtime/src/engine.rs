//! The detection engine
//!
//! One `detect` call: cache lookup, concurrent evidence fan-out across the
//! network probes and provider adapters, evaluation, aggregation, then cache
//! and history writes. Every failure below the engine degrades a signal;
//! the caller always gets a well-formed verdict.

use async_trait::async_trait;
use cidr::IpCidr;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use ipveil_core::{
    aggregate, evaluate_all, EvidenceSet, ScoringConfig, VerdictResult, DEFAULT_CACHE_TTL_SECS,
    VPN_TUNNEL_PORTS,
};
use ipveil_net::{
    check_blocklists, create_resolver, lookup_whois, reverse_ptr, sample_rtt, scan_ports,
    NetConfig,
};
use ipveil_providers::{default_adapters, fetch_all, merge_records, ProviderAdapter, ProviderConfig};

use crate::{default_ranges, CacheStore, HistoryStore};

/// Everything the engine needs tuned in one place
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub net: NetConfig,
    pub providers: ProviderConfig,
    /// How long a verdict stays cached
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            net: NetConfig::default(),
            providers: ProviderConfig::default(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Anything that can turn an address into a verdict. The engine is the real
/// implementation; bulk processing and tests depend on the trait.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, ip: IpAddr) -> VerdictResult;
}

pub struct DetectionEngine {
    config: EngineConfig,
    ranges: Vec<IpCidr>,
    resolver: TokioAsyncResolver,
    adapters: Vec<Box<dyn ProviderAdapter>>,
    cache: Arc<dyn CacheStore>,
    history: Arc<dyn HistoryStore>,
}

impl DetectionEngine {
    pub fn new(
        config: EngineConfig,
        cache: Arc<dyn CacheStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let resolver = create_resolver(&config.net);
        let adapters = default_adapters(&config.providers);
        Self {
            config,
            ranges: default_ranges(),
            resolver,
            adapters,
            cache,
            history,
        }
    }

    /// Replace the compiled-in range snapshot
    pub fn with_ranges(mut self, ranges: Vec<IpCidr>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn history(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.history)
    }

    /// Cache lookup; a store error is a miss
    async fn cached(&self, key: &str) -> Option<VerdictResult> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                debug!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Run every gathering leaf concurrently and join into one evidence set
    async fn gather(&self, ip: IpAddr) -> EvidenceSet {
        let (ports, rdns, whois, dnsbl, latency, records) = tokio::join!(
            scan_ports(ip, VPN_TUNNEL_PORTS, self.config.net.probe_timeout_ms),
            reverse_ptr(&self.resolver, ip),
            lookup_whois(ip, &self.config.net),
            check_blocklists(&self.resolver, ip),
            sample_rtt(ip, &self.config.net),
            fetch_all(&self.adapters, ip),
        );
        let (geo, intel) = merge_records(&records);

        EvidenceSet {
            ports: Some(ports),
            rdns,
            whois,
            dnsbl,
            geo,
            latency: Some(latency),
            intel,
        }
    }

    /// Score gathered evidence and persist the result. Cache and history
    /// write failures are logged, never propagated.
    pub async fn detect_with_evidence(&self, ip: IpAddr, evidence: &EvidenceSet) -> VerdictResult {
        let signals = evaluate_all(ip, evidence, &self.ranges, &self.config.scoring);
        let verdict = aggregate(ip, signals, &self.config.scoring);

        let key = ip.to_string();
        if let Err(e) = self.cache.set(&key, &verdict, self.config.cache_ttl).await {
            warn!(%ip, error = %e, "failed to cache verdict");
        }
        if let Err(e) = self.history.record(&verdict).await {
            warn!(%ip, error = %e, "failed to record history");
        }

        info!(
            %ip,
            score = verdict.score,
            verdict = ?verdict.verdict,
            signals = verdict.signals.len(),
            "detection complete"
        );
        verdict
    }
}

#[async_trait]
impl Detector for DetectionEngine {
    async fn detect(&self, ip: IpAddr) -> VerdictResult {
        let key = ip.to_string();
        if let Some(hit) = self.cached(&key).await {
            debug!(%ip, "cache hit");
            return hit;
        }

        let evidence = self.gather(ip).await;
        self.detect_with_evidence(ip, &evidence).await
    }
}
