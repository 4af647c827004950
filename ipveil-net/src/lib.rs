//! ipveil Net - network-level signal gathering
//!
//! TCP port probing, reverse DNS, DNSBL queries, RTT sampling, and raw
//! registry WHOIS. Every call carries its own timeout; a hung peer degrades
//! one signal, never the whole detection.

pub mod dnsbl;
pub mod latency;
pub mod ports;
pub mod rdns;
pub mod whois;

pub use dnsbl::*;
pub use latency::*;
pub use ports::*;
pub use rdns::*;
pub use whois::*;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use thiserror::Error;

/// Errors from network probing internals. Callers at the gathering boundary
/// translate these into an absent report; they never cross into scoring.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("empty response from {0}")]
    EmptyResponse(String),
}

/// Tunables for the gathering layer
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Hard per-port connect timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Timeout per DNS query
    pub dns_timeout: Duration,
    /// Number of RTT samples to take
    pub latency_samples: usize,
    /// Port used for RTT sampling
    pub latency_port: u16,
    /// Pause between RTT samples
    pub latency_interval: Duration,
    /// Timeout per registry WHOIS query
    pub whois_timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: ipveil_core::DEFAULT_PROBE_TIMEOUT_MS,
            dns_timeout: Duration::from_secs(2),
            latency_samples: 5,
            latency_port: 80,
            latency_interval: Duration::from_millis(100),
            whois_timeout: Duration::from_secs(5),
        }
    }
}

/// Build the shared resolver used for PTR and DNSBL queries
pub fn create_resolver(config: &NetConfig) -> TokioAsyncResolver {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 1;
    TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
}
