//! TCP port probing
//!
//! All probes for one detection run fly concurrently; each carries a hard
//! connect timeout so a filtered port cannot stall the join.

use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

use ipveil_core::{PortProbe, PortScanReport};

/// Probe one TCP port with a bounded connect timeout
pub async fn probe_port(ip: IpAddr, port: u16, timeout_ms: u64) -> PortProbe {
    let started = Instant::now();
    let attempt = timeout(
        Duration::from_millis(timeout_ms),
        TcpStream::connect((ip, port)),
    )
    .await;

    match attempt {
        Ok(Ok(_stream)) => PortProbe {
            port,
            open: true,
            latency_ms: started.elapsed().as_millis() as u64,
        },
        _ => PortProbe {
            port,
            open: false,
            latency_ms: timeout_ms,
        },
    }
}

/// Probe every port concurrently and join the results
pub async fn scan_ports(ip: IpAddr, ports: &[u16], timeout_ms: u64) -> PortScanReport {
    let futures: Vec<_> = ports
        .iter()
        .map(|&port| probe_port(ip, port, timeout_ms))
        .collect();
    let probes = futures::future::join_all(futures).await;
    PortScanReport { probes }
}
