use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest timeout a caller may ask for on a single probe.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug, Default)]
pub struct ProbeParams {
    /// Per-attempt timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl ProbeParams {
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout
            .map_or(default, Duration::from_millis)
            .min(MAX_TIMEOUT)
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorSerialization {
    pub error: String,
}

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}
