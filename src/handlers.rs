use std::sync::Arc;

use axum::extract::{Path, Query, State};
use mcprobe::{NamedStatus, NamedTarget, Prober, StatusSnapshot, DEFAULT_BEDROCK_PORT, DEFAULT_JAVA_PORT};

use crate::{
    structures::{Health, ProbeParams, MAX_TIMEOUT},
    Failure, Json,
};

/// Most targets accepted in one batch request.
pub const MAX_BATCH: usize = 64;

pub async fn ping_java(
    State(prober): State<Arc<Prober>>,
    Path(address): Path<String>,
    Query(params): Query<ProbeParams>,
) -> Result<Json<StatusSnapshot>, Failure> {
    let (host, port) = split_address(&address, DEFAULT_JAVA_PORT)?;
    let timeout = params.timeout_or(prober.config().default_timeout);
    Ok(Json(prober.probe_java(&host, port, timeout).await))
}

pub async fn ping_bedrock(
    State(prober): State<Arc<Prober>>,
    Path(address): Path<String>,
    Query(params): Query<ProbeParams>,
) -> Result<Json<StatusSnapshot>, Failure> {
    let (host, port) = split_address(&address, DEFAULT_BEDROCK_PORT)?;
    let timeout = params.timeout_or(prober.config().default_timeout);
    Ok(Json(prober.probe_bedrock(&host, port, timeout).await))
}

pub async fn ping_batch(
    State(prober): State<Arc<Prober>>,
    axum::Json(mut targets): axum::Json<Vec<NamedTarget>>,
) -> Result<Json<Vec<NamedStatus>>, Failure> {
    if targets.len() > MAX_BATCH {
        return Err(Failure::TooManyTargets(targets.len()));
    }
    if let Some(bad) = targets.iter().find(|t| t.host.trim().is_empty()) {
        return Err(Failure::InvalidAddress(bad.name.clone()));
    }
    cap_timeouts(&mut targets);
    Ok(Json(prober.probe_all(&targets).await))
}

/// Holds per-target timeouts to the same ceiling as single probes.
fn cap_timeouts(targets: &mut [NamedTarget]) {
    let max = u64::try_from(MAX_TIMEOUT.as_millis()).unwrap_or(u64::MAX);
    for target in targets {
        target.timeout = target.timeout.map(|millis| millis.min(max));
    }
}

#[allow(clippy::unused_async)]
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Splits `host`, `host:port`, `[v6]` or `[v6]:port`.
pub fn split_address(address: &str, default_port: u16) -> Result<(String, u16), Failure> {
    let invalid = || Failure::InvalidAddress(address.to_string());
    let address = address.trim();
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None if tail.is_empty() => default_port,
            None => return Err(invalid()),
        };
        return Ok((host.to_string(), port));
    }
    let (host, port) = match address.split_once(':') {
        Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
        None => (address, default_port),
    };
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_only() {
        assert_eq!(
            split_address("mc.hypixel.net", 25565).unwrap(),
            ("mc.hypixel.net".to_string(), 25565)
        );
    }

    #[test]
    fn test_split_host_and_port() {
        assert_eq!(
            split_address("13.212.76.209:23193", 25565).unwrap(),
            ("13.212.76.209".to_string(), 23193)
        );
    }

    #[test]
    fn test_split_ipv6() {
        assert_eq!(
            split_address("[::1]:19133", 19132).unwrap(),
            ("::1".to_string(), 19133)
        );
        assert_eq!(split_address("[::1]", 19132).unwrap(), ("::1".to_string(), 19132));
    }

    #[test]
    fn test_split_invalid() {
        assert!(split_address("", 25565).is_err());
        assert!(split_address("host:notaport", 25565).is_err());
        assert!(split_address("host:70000", 25565).is_err());
        assert!(split_address("[::1", 25565).is_err());
        assert!(split_address("[::1]x", 25565).is_err());
        assert!(split_address("a:1:2", 25565).is_err());
    }

    #[test]
    fn test_batch_timeouts_capped() {
        let target = |timeout| NamedTarget {
            name: "a".to_string(),
            host: "a.example".to_string(),
            port: None,
            timeout,
            edition: mcprobe::Edition::Java,
        };
        let mut targets = vec![target(Some(u64::MAX)), target(Some(250)), target(None)];
        cap_timeouts(&mut targets);
        assert_eq!(targets[0].timeout, Some(30_000));
        assert_eq!(targets[1].timeout, Some(250));
        assert_eq!(targets[2].timeout, None);
    }
}
