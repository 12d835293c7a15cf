//! Socket-level probes on top of the tokio runtime.

mod bedrock;
mod java;
mod query;
mod tcp;

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::OnceLock,
    time::{Duration, Instant},
};

use hickory_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
};
use tokio::net::UdpSocket;

pub use self::{bedrock::ping as bedrock_ping, java::status as java_status, query::query, tcp::measure};
use crate::{BedrockMotd, Error, JavaResponse, LatencySample, QueryResult};

/// The network operations a probe cycle is built from.
///
/// [`NetworkSource`] talks to real servers; tests substitute their own.
pub trait StatusSource: Send + Sync + 'static {
    /// Rewrites a Java `host:port` through its SRV record, if any.
    fn resolve(&self, host: &str, port: u16) -> impl Future<Output = (String, u16)> + Send;

    /// Transport-level connect time.
    fn measure(&self, host: &str, port: u16, timeout: Duration) -> impl Future<Output = LatencySample> + Send;

    /// One Server List Ping exchange.
    fn java_status(
        &self,
        host: &str,
        port: u16,
        protocol_version: u32,
        timeout: Duration,
    ) -> impl Future<Output = Result<JavaResponse, Error>> + Send;

    /// One query exchange. Never fails; an unanswered query is empty.
    fn query(&self, host: &str, port: u16, timeout: Duration) -> impl Future<Output = QueryResult> + Send;

    /// One unconnected ping, returning the round trip in milliseconds.
    fn bedrock_ping(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<(u64, BedrockMotd), Error>> + Send;
}

/// Probes real servers over the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkSource;

impl StatusSource for NetworkSource {
    async fn resolve(&self, host: &str, port: u16) -> (String, u16) {
        resolve_srv(host, port).await
    }

    async fn measure(&self, host: &str, port: u16, timeout: Duration) -> LatencySample {
        measure(host, port, timeout).await
    }

    async fn java_status(
        &self,
        host: &str,
        port: u16,
        protocol_version: u32,
        timeout: Duration,
    ) -> Result<JavaResponse, Error> {
        java_status(host, port, protocol_version, timeout).await
    }

    async fn query(&self, host: &str, port: u16, timeout: Duration) -> QueryResult {
        query(host, port, timeout).await
    }

    async fn bedrock_ping(&self, host: &str, port: u16, timeout: Duration) -> Result<(u64, BedrockMotd), Error> {
        bedrock_ping(host, port, timeout).await
    }
}

fn new_resolver() -> TokioAsyncResolver {
    let config = ResolverConfig::cloudflare();
    let mut opts = ResolverOpts::default();
    opts.cache_size = 64;
    opts.attempts = 3;
    TokioAsyncResolver::tokio(config, opts)
}

pub fn resolver() -> &'static TokioAsyncResolver {
    static RESOLVER: OnceLock<TokioAsyncResolver> = OnceLock::new();
    RESOLVER.get_or_init(new_resolver)
}

/// Looks up `_minecraft._tcp.<host>` and returns its target.
///
/// IP literals, lookup failures and empty answers all keep `host:port` as given.
pub async fn resolve_srv(host: &str, port: u16) -> (String, u16) {
    if host.parse::<IpAddr>().is_ok() {
        return (host.to_string(), port);
    }
    match resolver().srv_lookup(format!("_minecraft._tcp.{host}")).await {
        Ok(lookup) => {
            if let Some(srv) = lookup.iter().next() {
                let target = srv.target().to_utf8();
                let target = target.trim_end_matches('.').to_string();
                debug!(host, %target, port = srv.port(), "Resolved SRV record");
                return (target, srv.port());
            }
            (host.to_string(), port)
        }
        Err(error) => {
            trace!(host, %error, "No SRV record");
            (host.to_string(), port)
        }
    }
}

/// A UDP socket connected to the first address `host:port` resolves to.
async fn connect_udp(host: &str, port: u16) -> Result<UdpSocket, Error> {
    let remote = tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or(Error::DnsLookupFailed)?;
    let local: SocketAddr = if remote.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(remote).await?;
    Ok(socket)
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
