use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_BEDROCK_PORT, DEFAULT_JAVA_PORT};

/// The timeout applied to a probe when the caller doesn't give one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Which protocol family a server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Java,
    Bedrock,
}

impl Edition {
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Java => DEFAULT_JAVA_PORT,
            Self::Bedrock => DEFAULT_BEDROCK_PORT,
        }
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Java => f.write_str("java"),
            Self::Bedrock => f.write_str("bedrock"),
        }
    }
}

/// A single server to probe.
///
/// # Examples
///
/// ```
/// use mcprobe::{Edition, ProbeTarget};
/// use std::time::Duration;
///
/// let target = ProbeTarget::new(Edition::Bedrock, "play.nethergames.org")
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(target.port, 19132);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub edition: Edition,
    pub timeout: Duration,
}

impl ProbeTarget {
    /// A target on the edition's default port with the default timeout.
    pub fn new(edition: Edition, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: edition.default_port(),
            edition,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The cache key, `host:port`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The outcome of one transport-level reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample {
    pub online: bool,
    pub round_trip_millis: Option<u64>,
}

impl LatencySample {
    #[must_use]
    pub const fn online(round_trip_millis: u64) -> Self {
        Self {
            online: true,
            round_trip_millis: Some(round_trip_millis),
        }
    }

    #[must_use]
    pub const fn offline() -> Self {
        Self {
            online: false,
            round_trip_millis: None,
        }
    }
}

/// The status of a server as seen by one probe cycle.
///
/// An offline snapshot has every optional field empty, except a Java
/// attempt whose connection succeeded but whose handshake failed: it keeps
/// the connect latency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub online: bool,
    pub latency_millis: Option<u64>,
    pub motd: Option<String>,
    pub players_online: Option<i64>,
    pub players_max: Option<i64>,
    pub version_name: Option<String>,
    pub protocol_version: Option<i64>,
    pub software_label: Option<String>,
    pub level_name: Option<String>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl StatusSnapshot {
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }

    /// An offline snapshot that keeps a latency measured before the failure.
    #[must_use]
    pub fn offline_after(latency: u64) -> Self {
        Self {
            latency_millis: Some(latency),
            ..Self::default()
        }
    }

    /// Folds the snapshots of several attempts into one.
    ///
    /// The latency is the rounded mean over the online attempts, and every
    /// other field comes from the first online attempt. With no online
    /// attempt the first attempt is returned unchanged.
    #[must_use]
    pub fn aggregate(attempts: Vec<Self>) -> Self {
        let latencies: Vec<u64> = attempts
            .iter()
            .filter(|a| a.online)
            .map(|a| a.latency_millis.unwrap_or(0))
            .collect();
        let mut attempts = attempts.into_iter();
        if latencies.is_empty() {
            return attempts.next().unwrap_or_default();
        }
        let count = latencies.len() as u64;
        let mean = (latencies.iter().sum::<u64>() + count / 2) / count;
        let mut first = attempts
            .find(|a| a.online)
            .unwrap_or_default();
        first.latency_millis = Some(mean);
        first
    }
}
