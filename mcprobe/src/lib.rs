#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `mcprobe` determines the live status of Minecraft servers by speaking
//! their native status protocols directly.
//!
//! Java Edition servers are reached with the Server List Ping over TCP,
//! optionally enriched with the UDP Query protocol (level name, plugins).
//! Bedrock Edition servers are reached with a RakNet unconnected ping.
//!
//! Every probe runs several attempts, averages the latency of the ones that
//! got through, and caches the result per `host:port` for a short time.
//! Network and protocol failures never surface as errors: a server that
//! cannot be reached is reported as an offline [`StatusSnapshot`].
//!
//! The main API surface is [`Prober`].

#[macro_use]
extern crate tracing;

pub mod tokio;
pub mod varint;

mod bedrock;
mod cache;
mod classify;
mod dispatch;
mod java;
mod prober;
mod query;
mod status;

pub use bedrock::{
    BedrockEdition, BedrockMotd, DEFAULT_PORT as DEFAULT_BEDROCK_PORT, UnconnectedPing, UnconnectedPong,
};
pub use cache::{Admission, CacheEntry, Clock, StatusCache, SystemClock};
pub use classify::{bedrock_software, flatten_motd, java_software};
pub use dispatch::{NamedStatus, NamedTarget};
pub use java::{
    DEFAULT_PORT as DEFAULT_JAVA_PORT, DEFAULT_PROTOCOL_VERSION, ForgeData, ForgeMod, JavaResponse, ModInfo,
    ModMetadata, Player, Players, Version,
};
pub use prober::{Prober, ProberConfig};
pub use query::QueryResult;
pub use status::{DEFAULT_TIMEOUT, Edition, LatencySample, ProbeTarget, StatusSnapshot};
pub use varint::VarIntError;

/// Errors that can occur during a single probe attempt.
///
/// These are collapsed into offline snapshots by the [`Prober`]; only the
/// lower-level functions in [`tokio`] return them directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("an invalid packet was received: {0}")]
    InvalidPacket(&'static str),
    #[error("a VarInt error occurred: {0}")]
    VarInt(#[from] VarIntError),
    #[error("an I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
    #[error("a JSON error occurred: {0}")]
    JsonErr(#[from] serde_json::Error),
    #[error("the connection closed before a full response arrived")]
    ConnectionClosed,
    #[error("timed out waiting for the server")]
    TimedOut,
    #[error("DNS lookup for the host provided failed")]
    DnsLookupFailed,
}

impl From<::tokio::time::error::Elapsed> for Error {
    fn from(_: ::tokio::time::error::Elapsed) -> Self {
        Self::TimedOut
    }
}
