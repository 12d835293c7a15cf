use std::{sync::Arc, time::Duration};

use crate::{
    Edition, ProbeTarget, StatusCache, StatusSnapshot,
    cache::{Clock, SystemClock},
    java::DEFAULT_PROTOCOL_VERSION,
    status::DEFAULT_TIMEOUT,
    tokio::{NetworkSource, StatusSource},
};

/// Configuration for a [`Prober`].
///
/// # Examples
///
/// ```
/// use mcprobe::ProberConfig;
/// use std::time::Duration;
///
/// let config = ProberConfig {
///     default_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProberConfig {
    /// Sequential attempts per probe cycle.
    pub attempts: usize,
    /// How long a snapshot is served from cache.
    pub cache_ttl: Duration,
    /// Timeout for targets that don't carry their own.
    pub default_timeout: Duration,
    /// The protocol version announced in Java handshakes.
    pub protocol_version: u32,
    /// Whether Java hosts are rewritten through `_minecraft._tcp` SRV records.
    pub resolve_srv: bool,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            cache_ttl: Duration::from_millis(5000),
            default_timeout: DEFAULT_TIMEOUT,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            resolve_srv: true,
        }
    }
}

/// Probes servers with retries, latency averaging and a per-host cache.
///
/// Java and Bedrock results are cached separately under `host:port`.
pub struct Prober<S = NetworkSource> {
    config: ProberConfig,
    source: S,
    clock: Arc<dyn Clock>,
    java_cache: StatusCache,
    bedrock_cache: StatusCache,
}

impl Prober<NetworkSource> {
    #[must_use]
    pub fn new(config: ProberConfig) -> Self {
        Self::with_source(config, NetworkSource, Arc::new(SystemClock))
    }
}

impl Default for Prober<NetworkSource> {
    fn default() -> Self {
        Self::new(ProberConfig::default())
    }
}

impl<S: StatusSource> Prober<S> {
    pub fn with_source(config: ProberConfig, source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            java_cache: StatusCache::new(config.cache_ttl),
            bedrock_cache: StatusCache::new(config.cache_ttl),
            config,
            source,
            clock,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Status of a Java server.
    pub async fn probe_java(&self, host: &str, port: u16, timeout: Duration) -> StatusSnapshot {
        self.probe(
            &ProbeTarget::new(Edition::Java, host)
                .with_port(port)
                .with_timeout(timeout),
        )
        .await
    }

    /// Status of a Bedrock server.
    pub async fn probe_bedrock(&self, host: &str, port: u16, timeout: Duration) -> StatusSnapshot {
        self.probe(
            &ProbeTarget::new(Edition::Bedrock, host)
                .with_port(port)
                .with_timeout(timeout),
        )
        .await
    }

    /// Status of any target, served from cache while fresh.
    pub async fn probe(&self, target: &ProbeTarget) -> StatusSnapshot {
        let cache = match target.edition {
            Edition::Java => &self.java_cache,
            Edition::Bedrock => &self.bedrock_cache,
        };
        let key = target.key();
        if let Some(hit) = cache.get(&key, self.clock.now_millis()) {
            trace!(%key, edition = %target.edition, "Cache hit");
            return hit;
        }

        let _admission = cache.admit(&key).await;
        if let Some(hit) = cache.get(&key, self.clock.now_millis()) {
            trace!(%key, edition = %target.edition, "Cache filled while waiting");
            return hit;
        }

        let snapshot = match target.edition {
            Edition::Java => self.java_cycle(target).await,
            Edition::Bedrock => self.bedrock_cycle(target).await,
        };
        debug!(
            %key,
            edition = %target.edition,
            online = snapshot.online,
            latency = ?snapshot.latency_millis,
            "Probe cycle finished"
        );
        cache.put(key, snapshot.clone(), self.clock.now_millis());
        snapshot
    }

    async fn java_cycle(&self, target: &ProbeTarget) -> StatusSnapshot {
        let (host, port) = if self.config.resolve_srv {
            self.source.resolve(&target.host, target.port).await
        } else {
            (target.host.clone(), target.port)
        };

        let mut attempts = Vec::with_capacity(self.config.attempts);
        for attempt in 0..self.config.attempts {
            let sample = self.source.measure(&host, port, target.timeout).await;
            let Some(latency) = sample.round_trip_millis.filter(|_| sample.online) else {
                debug!(%host, port, attempt, "Java server unreachable");
                attempts.push(StatusSnapshot::offline());
                continue;
            };
            match self
                .source
                .java_status(&host, port, self.config.protocol_version, target.timeout)
                .await
            {
                Ok(response) => attempts.push(response.into_snapshot(latency)),
                Err(error) => {
                    debug!(%host, port, attempt, latency, %error, "Java status attempt failed");
                    attempts.push(StatusSnapshot::offline_after(latency));
                }
            }
        }

        let mut snapshot = StatusSnapshot::aggregate(attempts);
        let query = self.source.query(&host, port, target.timeout).await;
        snapshot.level_name = query.level_name;
        snapshot.plugins = query.plugins;
        snapshot
    }

    async fn bedrock_cycle(&self, target: &ProbeTarget) -> StatusSnapshot {
        let mut attempts = Vec::with_capacity(self.config.attempts);
        for attempt in 0..self.config.attempts {
            match self
                .source
                .bedrock_ping(&target.host, target.port, target.timeout)
                .await
            {
                Ok((latency, motd)) => attempts.push(motd.to_snapshot(latency)),
                Err(error) => {
                    debug!(host = %target.host, port = target.port, attempt, %error, "Bedrock ping failed");
                    attempts.push(StatusSnapshot::offline());
                }
            }
        }
        StatusSnapshot::aggregate(attempts)
    }
}
