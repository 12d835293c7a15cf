//! Implementation of the `RakNet` ping/pong protocol.
//! [Raknet: Unconnected Ping](https://wiki.vg/Raknet_Protocol#Unconnected_Ping)

use crate::{Error, StatusSnapshot, classify::bedrock_software};

/// Raknets default `OFFLINE_MESSAGE_DATA_ID`.
/// See more: [Raknet: Data Types](https://wiki.vg/Raknet_Protocol#Data_types)
pub const OFFLINE_MESSAGE_DATA_ID: &[u8; 16] = &[
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

/// The default port of a Raknet Bedrock Server.
pub const DEFAULT_PORT: u16 = 19132;

const UNCONNECTED_PING: u8 = 0x01;
const UNCONNECTED_PONG: u8 = 0x1c;

/// Offset of the big-endian MOTD length inside a pong.
const MOTD_LENGTH_OFFSET: usize = 33;
const MOTD_OFFSET: usize = 35;

/// Represents the edition of a bedrock server.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BedrockEdition {
    PocketEdition,
    EducationEdition,
    /// An unknown edition string.
    Other(String),
}

impl std::fmt::Display for BedrockEdition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PocketEdition => f.write_str("MCPE"),
            Self::EducationEdition => f.write_str("MCEE"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl From<&str> for BedrockEdition {
    fn from(edition: &str) -> Self {
        match edition.to_lowercase().as_ref() {
            "mcpe" => Self::PocketEdition,
            "mcee" => Self::EducationEdition,
            _ => Self::Other(edition.to_string()),
        }
    }
}

/// The semicolon-separated status string carried by an unconnected pong.
///
/// See More: [Raknet: Unconnected Pong](https://wiki.vg/Raknet_Protocol#Unconnected_Pong)
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BedrockMotd {
    pub edition: BedrockEdition,
    /// The server name, i.e. the first MOTD line.
    pub name: String,
    pub protocol: Option<i64>,
    pub version: String,
    pub player_count: Option<i64>,
    pub player_max: Option<i64>,
    pub server_guid: Option<u64>,
    /// The second MOTD line, which servers use for the level name.
    pub sub_name: Option<String>,
    pub gamemode: Option<String>,
    /// The wire sends `0` for limited and `1` for unrestricted.
    pub nintendo_limited: Option<bool>,
    pub port_v4: Option<u16>,
    pub port_v6: Option<u16>,
    pub editor_mode: Option<bool>,
}

impl BedrockMotd {
    /// Extracts the positional fields.
    ///
    /// At least five fields are required. Trailing fields that are missing
    /// or empty are left as `None`.
    pub(crate) fn extract(payload: &str) -> Option<Self> {
        let parts: Vec<&str> = payload.split(';').collect();
        if parts.len() < 5 {
            return None;
        }
        let field = |i: usize| parts.get(i).copied().filter(|s| !s.is_empty());
        let number = |i: usize| field(i).and_then(|s| s.parse::<i64>().ok());

        Some(Self {
            edition: BedrockEdition::from(parts[0]),
            name: parts[1].to_string(),
            protocol: number(2),
            version: parts[3].to_string(),
            player_count: number(4),
            player_max: number(5),
            server_guid: field(6).and_then(parse_guid),
            sub_name: field(7).map(ToString::to_string),
            gamemode: field(8).map(ToString::to_string),
            nintendo_limited: match field(9) {
                Some("0") => Some(true),
                Some("1") => Some(false),
                _ => None,
            },
            port_v4: field(10).and_then(|s| s.parse().ok()),
            port_v6: field(11).and_then(|s| s.parse().ok()),
            editor_mode: number(12).map(|flag| flag != 0),
        })
    }

    /// Turns the status into an online snapshot with the given latency.
    #[must_use]
    pub fn to_snapshot(&self, latency_millis: u64) -> StatusSnapshot {
        StatusSnapshot {
            online: true,
            latency_millis: Some(latency_millis),
            motd: Some(self.name.clone()),
            players_online: self.player_count,
            players_max: self.player_max,
            version_name: Some(self.version.clone()),
            protocol_version: self.protocol,
            software_label: Some(bedrock_software(&self.edition).to_string()),
            level_name: self.sub_name.clone(),
            plugins: Vec::new(),
            favicon: None,
        }
    }
}

/// Some servers print the GUID as a signed 64-bit number.
#[allow(clippy::cast_sign_loss)]
fn parse_guid(s: &str) -> Option<u64> {
    s.parse::<u64>()
        .ok()
        .or_else(|| s.parse::<i64>().ok().map(|v| v as u64))
}

/// The unconnected ping a client broadcasts to discover servers.
#[derive(Debug, Clone, Copy)]
pub struct UnconnectedPing {
    pub time: i64,
    pub client_guid: [u8; 8],
}

impl UnconnectedPing {
    /// The 33-byte wire frame.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 33] {
        let mut frame = [0u8; 33];
        frame[0] = UNCONNECTED_PING;
        frame[1..9].copy_from_slice(&self.time.to_le_bytes());
        frame[9..25].copy_from_slice(OFFLINE_MESSAGE_DATA_ID);
        frame[25..33].copy_from_slice(&self.client_guid);
        frame
    }
}

/// The server's reply to an [`UnconnectedPing`].
#[derive(Debug, Clone)]
pub struct UnconnectedPong {
    pub time: u64,
    pub server_id: u64,
    pub payload: String,
}

impl UnconnectedPong {
    /// Validates and splits a pong datagram.
    ///
    /// # Errors
    /// If the datagram is short, carries another message id, or declares a
    /// MOTD longer than itself.
    pub fn read(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < MOTD_OFFSET {
            return Err(Error::InvalidPacket("pong shorter than 35 bytes"));
        }
        if buf[0] != UNCONNECTED_PONG {
            return Err(Error::InvalidPacket("unexpected message id"));
        }
        let motd_len = usize::from(u16::from_be_bytes([
            buf[MOTD_LENGTH_OFFSET],
            buf[MOTD_LENGTH_OFFSET + 1],
        ]));
        let payload = buf
            .get(MOTD_OFFSET..MOTD_OFFSET + motd_len)
            .ok_or(Error::InvalidPacket("MOTD exceeds datagram"))?;
        let mut word = [0u8; 8];
        word.copy_from_slice(&buf[1..9]);
        let time = u64::from_be_bytes(word);
        word.copy_from_slice(&buf[9..17]);
        let server_id = u64::from_be_bytes(word);
        Ok(Self {
            time,
            server_id,
            payload: String::from_utf8_lossy(payload).into_owned(),
        })
    }
}

/// Parses a pong datagram all the way to its status fields.
///
/// # Errors
/// If the pong is invalid or its status string has fewer than five fields.
pub fn parse_pong(buf: &[u8]) -> Result<BedrockMotd, Error> {
    let pong = UnconnectedPong::read(buf)?;
    BedrockMotd::extract(&pong.payload).ok_or(Error::InvalidPacket("too few MOTD fields"))
}
