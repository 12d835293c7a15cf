//! Implementation of the Java Minecraft ping protocol.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::ops::Range;

use serde::Deserialize;

use crate::{
    StatusSnapshot,
    classify::{flatten_motd, java_software},
    varint::{self, VarIntError},
};

/// The default port of a Java server.
pub const DEFAULT_PORT: u16 = 25565;

/// The protocol version sent in the handshake (1.18.2).
pub const DEFAULT_PROTOCOL_VERSION: u32 = 758;

/// Forge's legacy mod list, advertised by 1.12 and older.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModInfo {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "modList")]
    pub mod_list: Vec<ModMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModMetadata {
    pub modid: Option<String>,
    pub version: Option<String>,
}

/// Forge's mod list for 1.13 and newer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgeData {
    pub mods: Vec<ForgeMod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgeMod {
    #[serde(rename = "modId")]
    pub mod_id: Option<String>,
    pub modmarker: Option<String>,
}

/// The server status response.
///
/// Every field is optional: servers in the wild send all kinds of partial
/// payloads, and a missing key is not a reason to call a server offline.
/// More information can be found [here](https://wiki.vg/Server_List_Ping).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JavaResponse {
    pub version: Option<Version>,
    pub players: Option<Players>,
    /// The description of the server (MOTD), as a chat component.
    pub description: Option<serde_json::Value>,
    /// The server icon (a Base64-encoded PNG image)
    pub favicon: Option<String>,
    pub modinfo: Option<ModInfo>,
    #[serde(rename = "forgeData")]
    pub forge_data: Option<ForgeData>,
    #[serde(rename = "enforcesSecureChat")]
    pub enforces_secure_chat: Option<bool>,
}

/// Information about the server's version
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Version {
    /// In practice this comes in a large variety of different formats.
    pub name: Option<String>,
    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers)
    pub protocol: Option<i64>,
}

/// An online player of the server.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Player {
    pub name: Option<String>,
    pub id: Option<String>,
}

/// The stats for players on the server.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Players {
    pub max: Option<i64>,
    pub online: Option<i64>,
    pub sample: Option<Vec<Player>>,
}

impl JavaResponse {
    /// The mod loader advertised alongside the status, if any.
    #[must_use]
    pub fn mod_loader(&self) -> Option<&'static str> {
        if let Some(info) = self.modinfo.as_ref().filter(|m| !m.mod_list.is_empty()) {
            return Some(if info.kind.as_deref() == Some("FML") {
                "Forge"
            } else {
                "Fabric"
            });
        }
        self.forge_data
            .as_ref()
            .filter(|f| !f.mods.is_empty())
            .map(|_| "Forge")
    }

    /// Turns the response into an online snapshot with the given latency.
    #[must_use]
    pub fn into_snapshot(self, latency_millis: u64) -> StatusSnapshot {
        let version_name = self.version.as_ref().and_then(|v| v.name.clone());
        let software = java_software(version_name.as_deref(), self.mod_loader());
        StatusSnapshot {
            online: true,
            latency_millis: Some(latency_millis),
            motd: self.description.as_ref().and_then(flatten_motd),
            players_online: self.players.as_ref().and_then(|p| p.online),
            players_max: self.players.as_ref().and_then(|p| p.max),
            protocol_version: self.version.as_ref().and_then(|v| v.protocol),
            version_name,
            software_label: software.map(ToString::to_string),
            level_name: None,
            plugins: Vec::new(),
            favicon: self.favicon,
        }
    }
}

/// Serverbound packets of the handshaking and status states.
#[derive(Debug)]
pub enum Packet<'a> {
    Handshake {
        version: u32,
        host: &'a str,
        port: u16,
        next_state: u32,
    },
    Request,
}

impl Packet<'_> {
    const fn id(&self) -> u8 {
        match self {
            // each packet is the first of its protocol state
            Self::Handshake { .. } | Self::Request => 0x00,
        }
    }

    /// Serializes the packet with its VarInt length prefix.
    ///
    /// # Errors
    /// If the host is too long to be length-prefixed.
    pub fn encode(&self) -> Result<Vec<u8>, VarIntError> {
        let mut body = vec![self.id()];
        if let Self::Handshake {
            version,
            host,
            port,
            next_state,
        } = self
        {
            varint::write(&mut body, *version);
            body.extend(varint::encode(host.len() as u64)?);
            body.extend_from_slice(host.as_bytes());
            body.extend_from_slice(&port.to_be_bytes());
            varint::write(&mut body, *next_state);
        }
        let mut framed = varint::encode(body.len() as u64)?;
        framed.extend(body);
        Ok(framed)
    }
}

/// Builds the handshake and status request, ready to be written back to back.
///
/// # Errors
/// If the host is too long to be length-prefixed.
pub fn status_request(host: &str, port: u16, protocol_version: u32) -> Result<Vec<u8>, VarIntError> {
    let mut out = Packet::Handshake {
        version: protocol_version,
        host,
        port,
        next_state: 1,
    }
    .encode()?;
    out.extend(Packet::Request.encode()?);
    Ok(out)
}

/// What the bytes received so far amount to.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// More bytes are needed before anything can be decided.
    Incomplete,
    /// A packet other than the status response is at the front.
    Other(u32),
    /// The status response is complete; the range covers its JSON.
    Status(Range<usize>),
}

/// Tries to find a complete status response at the start of `buf`.
///
/// Running out of bytes is the normal state while the response is still
/// streaming in, so underflow maps to [`Frame::Incomplete`] rather than an error.
///
/// # Errors
/// If one of the VarInts is malformed.
pub fn decode_frame(buf: &[u8]) -> Result<Frame, VarIntError> {
    let attempt = || -> Result<Frame, VarIntError> {
        let (_, len_size) = varint::decode(buf, 0)?;
        let (packet_id, id_size) = varint::decode(buf, len_size)?;
        if packet_id != 0x00 {
            return Ok(Frame::Other(packet_id));
        }
        let (json_len, json_len_size) = varint::decode(buf, len_size + id_size)?;
        let start = len_size + id_size + json_len_size;
        let end = start + json_len as usize;
        if buf.len() < end {
            return Ok(Frame::Incomplete);
        }
        Ok(Frame::Status(start..end))
    };
    match attempt() {
        Err(VarIntError::BufferUnderflow) => Ok(Frame::Incomplete),
        other => other,
    }
}
