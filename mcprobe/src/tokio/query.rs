use std::time::Duration;

use super::connect_udp;
use crate::{
    Error, QueryResult,
    query::{challenge_token, handshake_packet, parse_stat, stat_packet},
};

const MAX_DATAGRAM: usize = 16 * 1024;

/// Asks `host:port` for its level name and plugin list over the Query protocol.
///
/// Query is usually disabled server-side, so any failure (including the
/// whole exchange exceeding `timeout`) yields an empty result.
pub async fn query(host: &str, port: u16, timeout: Duration) -> QueryResult {
    match tokio::time::timeout(timeout, exchange(host, port)).await {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => {
            debug!(host, port, %error, "Query failed");
            QueryResult::default()
        }
        Err(_) => {
            debug!(host, port, "Query timed out");
            QueryResult::default()
        }
    }
}

async fn exchange(host: &str, port: u16) -> Result<QueryResult, Error> {
    let socket = connect_udp(host, port).await?;
    let session_id = rand::random::<u32>() & 0x7fff_ffff;
    socket.send(&handshake_packet(session_id)).await?;

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let token = loop {
        let len = socket.recv(&mut buf).await?;
        if let Some(token) = challenge_token(&buf[..len]) {
            break token;
        }
    };

    socket.send(&stat_packet(session_id, token)).await?;
    let len = socket.recv(&mut buf).await?;
    Ok(parse_stat(&buf[..len]))
}

#[cfg(test)]
mod tests {
    use tokio::net::UdpSocket;

    use super::*;

    #[tokio::test]
    async fn test_query_two_phase_exchange() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 7);
            assert_eq!(&buf[..3], &[0xfe, 0xfd, 0x09]);
            let session = buf[3..7].to_vec();

            let mut challenge = vec![0x09];
            challenge.extend_from_slice(&session);
            challenge.extend_from_slice(b"424242\0");
            server.send_to(&challenge, peer).await.unwrap();

            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 15);
            assert_eq!(&buf[3..7], session.as_slice());
            assert_eq!(&buf[7..11], &424_242u32.to_be_bytes());

            let mut stat = vec![0x00];
            stat.extend_from_slice(&session);
            stat.extend_from_slice(b"level-name\0world\0plugins\0Paper on Bukkit: LuckPerms, Vault\0");
            server.send_to(&stat, peer).await.unwrap();
        });

        let result = query("127.0.0.1", port, Duration::from_secs(2)).await;
        assert_eq!(result.level_name.as_deref(), Some("world"));
        assert_eq!(result.plugins, ["LuckPerms", "Vault"]);
    }

    #[tokio::test]
    async fn test_query_silence_is_empty() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let result = query("127.0.0.1", port, Duration::from_millis(200)).await;
        assert_eq!(result, QueryResult::default());
    }
}
