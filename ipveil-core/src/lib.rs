//! ipveil Core - Signal types and scoring engine for VPN/proxy detection
//!
//! This crate provides the foundational primitives:
//! - Per-signal evaluation results with weights and confidence
//! - Normalized evidence reports fed in by the gathering layers
//! - Pure signal evaluators (CIDR, ports, rDNS, WHOIS, DNSBL, geo, link quality)
//! - The weight-normalized aggregator producing the final verdict

pub mod aggregate;
pub mod config;
pub mod evaluate;
pub mod evidence;
pub mod signals;

pub use aggregate::*;
pub use config::*;
pub use evaluate::*;
pub use evidence::*;
pub use signals::*;

/// Default cache TTL for verdicts, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Per-probe TCP connect timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 500;

/// VPN/tunnel/proxy ports probed by the port-scan signal
pub const VPN_TUNNEL_PORTS: &[u16] = &[1194, 1723, 500, 4500, 1701, 8080, 3128];
