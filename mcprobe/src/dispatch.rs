use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::{Edition, ProbeTarget, Prober, StatusSnapshot, tokio::StatusSource};

/// A labelled target in a fan-out request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedTarget {
    pub name: String,
    pub host: String,
    pub port: Option<u16>,
    /// Timeout in milliseconds.
    pub timeout: Option<u64>,
    #[serde(rename = "type")]
    pub edition: Edition,
}

impl NamedTarget {
    fn to_target(&self, default_timeout: Duration) -> ProbeTarget {
        ProbeTarget::new(self.edition, self.host.clone())
            .with_port(self.port.unwrap_or_else(|| self.edition.default_port()))
            .with_timeout(self.timeout.map_or(default_timeout, Duration::from_millis))
    }
}

/// A fan-out result: the target's label alongside its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub edition: Edition,
    #[serde(flatten)]
    pub status: StatusSnapshot,
}

impl<S: StatusSource> Prober<S> {
    /// Probes every target concurrently.
    ///
    /// Each target runs in its own task, so one that panics or stalls
    /// cannot take the others down. The result has the same length and
    /// order as `targets`; a target whose task failed is reported offline.
    pub async fn probe_all(self: &Arc<Self>, targets: &[NamedTarget]) -> Vec<NamedStatus> {
        let default_timeout = self.config().default_timeout;
        let tasks = targets.iter().map(|named| {
            let prober = Arc::clone(self);
            let target = named.to_target(default_timeout);
            tokio::spawn(async move { prober.probe(&target).await })
        });
        let outcomes = join_all(tasks.collect::<Vec<_>>()).await;

        targets
            .iter()
            .zip(outcomes)
            .map(|(named, outcome)| NamedStatus {
                name: named.name.clone(),
                edition: named.edition,
                status: outcome.unwrap_or_else(|error| {
                    warn!(name = %named.name, host = %named.host, %error, "Probe task failed");
                    StatusSnapshot::offline()
                }),
            })
            .collect()
    }
}
