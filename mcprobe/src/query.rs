//! The GameSpy-derived Query protocol.
//! [Query](https://wiki.vg/Query)

const MAGIC: [u8; 2] = [0xfe, 0xfd];
const HANDSHAKE: u8 = 0x09;
const STAT: u8 = 0x00;

/// Bytes of type and session id in front of every response payload.
const RESPONSE_HEADER: usize = 5;

/// What the query exchange contributes to a Java snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub level_name: Option<String>,
    pub plugins: Vec<String>,
}

/// The challenge handshake for `session_id`.
#[must_use]
pub fn handshake_packet(session_id: u32) -> [u8; 7] {
    let mut packet = [0u8; 7];
    packet[..2].copy_from_slice(&MAGIC);
    packet[2] = HANDSHAKE;
    packet[3..].copy_from_slice(&session_id.to_be_bytes());
    packet
}

/// The stat request, padded with four zero bytes.
#[must_use]
pub fn stat_packet(session_id: u32, challenge_token: u32) -> [u8; 15] {
    let mut packet = [0u8; 15];
    packet[..2].copy_from_slice(&MAGIC);
    packet[2] = STAT;
    packet[3..7].copy_from_slice(&session_id.to_be_bytes());
    packet[7..11].copy_from_slice(&challenge_token.to_be_bytes());
    packet
}

/// Reads the challenge token from a handshake response.
///
/// Vanilla servers send the token as NUL-terminated ASCII decimal after the
/// header. Without one, bytes `[1..5)` are taken as a big-endian token.
/// Responses shorter than 5 bytes carry no token.
#[must_use]
pub fn challenge_token(response: &[u8]) -> Option<u32> {
    if response.len() < RESPONSE_HEADER {
        return None;
    }
    let decimal = response[RESPONSE_HEADER..]
        .split(|b| *b == 0)
        .next()
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|digits| digits.parse::<i32>().ok());
    #[allow(clippy::cast_sign_loss)]
    let token = decimal.map_or_else(
        || u32::from_be_bytes([response[1], response[2], response[3], response[4]]),
        |token| token as u32,
    );
    Some(token)
}

/// Parses a stat response into the level name and plugin list.
///
/// The payload after the header is NUL-separated and consumed as key/value
/// pairs; a trailing key without a value is ignored.
#[must_use]
pub fn parse_stat(response: &[u8]) -> QueryResult {
    let mut result = QueryResult::default();
    if response.len() <= RESPONSE_HEADER {
        return result;
    }
    let data = String::from_utf8_lossy(&response[RESPONSE_HEADER..]);
    let tokens: Vec<&str> = data.split('\0').collect();
    for pair in tokens.chunks_exact(2) {
        match pair[0] {
            "level-name" | "map" => result.level_name = Some(pair[1].to_string()),
            "plugins" => result.plugins = split_plugins(pair[1]),
            _ => {}
        }
    }
    result
}

/// Splits `"<brand> on <platform>: A, B"` into `["A", "B"]`.
fn split_plugins(value: &str) -> Vec<String> {
    let list = value.split_once(": ").map_or(value, |(_, rest)| rest);
    list.split(", ")
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &[u8]) -> Vec<u8> {
        let mut out = vec![STAT, 0, 0, 0, 1];
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_packets() {
        assert_eq!(
            handshake_packet(0x0102_0304),
            [0xfe, 0xfd, 0x09, 0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            stat_packet(1, 0x0a0b_0c0d),
            [0xfe, 0xfd, 0x00, 0, 0, 0, 1, 0x0a, 0x0b, 0x0c, 0x0d, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_challenge_token_binary() {
        assert_eq!(challenge_token(&[0x09, 0x00, 0x00, 0x30, 0x39]), Some(12345));
        assert_eq!(challenge_token(&[0x09, 0x00, 0x00]), None);
        assert_eq!(
            challenge_token(&[0x09, 0xde, 0xad, 0xbe, 0xef, b'x', b'y', 0x00]),
            Some(0xdead_beef)
        );
        assert_eq!(challenge_token(&[0x09, 0x00, 0x00, 0x01, 0x00, 0x00]), Some(256));
    }

    #[test]
    fn test_challenge_token_decimal() {
        let mut vanilla = vec![0x09, 0, 0, 0, 1];
        vanilla.extend_from_slice(b"9513307\0");
        assert_eq!(challenge_token(&vanilla), Some(9_513_307));

        let mut negative = vec![0x09, 0, 0, 0, 1];
        negative.extend_from_slice(b"-1\0");
        assert_eq!(challenge_token(&negative), Some(u32::MAX));
    }

    #[test]
    fn test_parse_stat() {
        let result = parse_stat(&response(
            b"level-name\0world\0plugins\0CraftBukkit on Bukkit 1.20.1: WorldEdit, Essentials\0",
        ));
        assert_eq!(result.level_name.as_deref(), Some("world"));
        assert_eq!(result.plugins, ["WorldEdit", "Essentials"]);
    }

    #[test]
    fn test_parse_stat_full_layout() {
        let result = parse_stat(&response(
            b"splitnum\0\x80\0hostname\0A Server\0map\0survival\0plugins\0\0numplayers\00\0\0\x01player_\0\0",
        ));
        assert_eq!(result.level_name.as_deref(), Some("survival"));
        assert!(result.plugins.is_empty());
    }

    #[test]
    fn test_parse_stat_odd_trailing_token() {
        let result = parse_stat(&response(b"level-name\0world\0plugins"));
        assert_eq!(result.level_name.as_deref(), Some("world"));
        assert!(result.plugins.is_empty());
    }

    #[test]
    fn test_parse_stat_short() {
        assert_eq!(parse_stat(&[0, 0, 0, 0, 1]), QueryResult::default());
    }

    #[test]
    fn test_split_plugins_without_brand() {
        assert_eq!(split_plugins("A, B, , C"), ["A", "B", "C"]);
        assert!(split_plugins("").is_empty());
    }
}
