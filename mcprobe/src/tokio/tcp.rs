use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use super::elapsed_millis;
use crate::LatencySample;

/// Measures how long a TCP connect to `host:port` takes.
///
/// The connection is dropped as soon as it is established; nothing is sent.
/// Refusals, resolution failures and timeouts all come back offline.
pub async fn measure(host: &str, port: u16, timeout: Duration) -> LatencySample {
    let start = Instant::now();
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            let rtt = elapsed_millis(start);
            drop(stream);
            LatencySample::online(rtt)
        }
        Ok(Err(error)) => {
            debug!(host, port, %error, "TCP connect failed");
            LatencySample::offline()
        }
        Err(_) => {
            debug!(host, port, "TCP connect timed out");
            LatencySample::offline()
        }
    }
}
