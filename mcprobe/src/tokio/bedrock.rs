use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::{connect_udp, elapsed_millis};
use crate::{
    BedrockMotd, Error,
    bedrock::{UnconnectedPing, parse_pong},
};

/// Largest datagram we accept; the MOTD length is a `u16`.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Sends one unconnected ping to `host:port` and waits for the pong.
///
/// Returns the time between sending the ping and receiving the pong, in
/// milliseconds, together with the parsed status.
///
/// # Errors
/// On resolution or socket failure, timeout, or an invalid pong.
pub async fn ping(host: &str, port: u16, timeout: Duration) -> Result<(u64, BedrockMotd), Error> {
    tokio::time::timeout(timeout, exchange(host, port)).await?
}

async fn exchange(host: &str, port: u16) -> Result<(u64, BedrockMotd), Error> {
    let socket = connect_udp(host, port).await?;
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
    let ping = UnconnectedPing {
        time,
        client_guid: rand::random::<u64>().to_le_bytes(),
    };

    let start = Instant::now();
    socket.send(&ping.to_bytes()).await?;
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let len = socket.recv(&mut buf).await?;
    let latency = elapsed_millis(start);

    let motd = parse_pong(&buf[..len])?;
    Ok((latency, motd))
}

#[cfg(test)]
mod tests {
    use tokio::net::UdpSocket;

    use super::*;
    use crate::bedrock::OFFLINE_MESSAGE_DATA_ID;

    async fn fake_server(reply: fn(&[u8]) -> Vec<u8>) -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            socket.send_to(&reply(&buf[..len]), peer).await.unwrap();
        });
        port
    }

    fn pong(request: &[u8]) -> Vec<u8> {
        assert_eq!(request.len(), 33);
        assert_eq!(request[0], 0x01);
        assert_eq!(&request[9..25], OFFLINE_MESSAGE_DATA_ID);
        let motd = b"MCPE;Fake;390;1.16.200;4;8;99;Lobby;Survival;1;19132;19133;";
        let mut out = vec![0x1c];
        out.extend_from_slice(&request[1..9]);
        out.extend_from_slice(&1u64.to_be_bytes());
        out.extend_from_slice(OFFLINE_MESSAGE_DATA_ID);
        out.extend_from_slice(&u16::try_from(motd.len()).unwrap().to_be_bytes());
        out.extend_from_slice(motd);
        out
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let port = fake_server(pong).await;
        let (_latency, motd) = ping("127.0.0.1", port, Duration::from_secs(2)).await.unwrap();
        assert_eq!(motd.name, "Fake");
        assert_eq!(motd.player_count, Some(4));
        assert_eq!(motd.sub_name.as_deref(), Some("Lobby"));
    }

    #[tokio::test]
    async fn test_ping_rejects_wrong_message_id() {
        let port = fake_server(|request| {
            let mut out = pong(request);
            out[0] = 0x1d;
            out
        })
        .await;
        let result = ping("127.0.0.1", port, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(Error::InvalidPacket(_))));
    }

    #[tokio::test]
    async fn test_ping_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let result = ping("127.0.0.1", port, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(Error::TimedOut)));
    }
}
