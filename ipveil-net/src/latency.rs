//! Round-trip time sampling over TCP connects

use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use ipveil_core::LatencyReport;

use crate::NetConfig;

/// Take repeated TCP connect samples against the configured port.
///
/// A connect that fails or times out is recorded as a lost sample so the
/// loss percentage reflects it. The caller decides whether enough samples
/// survived to score.
pub async fn sample_rtt(ip: IpAddr, config: &NetConfig) -> LatencyReport {
    let mut samples_ms = Vec::with_capacity(config.latency_samples);
    let connect_timeout = Duration::from_millis(config.probe_timeout_ms.max(1000));

    for i in 0..config.latency_samples {
        if i > 0 {
            sleep(config.latency_interval).await;
        }
        let started = Instant::now();
        let attempt = timeout(
            connect_timeout,
            TcpStream::connect((ip, config.latency_port)),
        )
        .await;
        match attempt {
            Ok(Ok(_stream)) => {
                samples_ms.push(Some(started.elapsed().as_secs_f64() * 1000.0));
            }
            _ => samples_ms.push(None),
        }
    }

    LatencyReport { samples_ms }
}
