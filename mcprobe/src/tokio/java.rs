use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    Error, JavaResponse,
    java::{self, Frame},
};

/// Performs one Server List Ping against `host:port`.
///
/// Connecting, sending the handshake and reading the response all share
/// `timeout`. The connection is closed as soon as the status JSON has
/// been read.
///
/// # Errors
/// On connect failure, timeout, early close, or a malformed response.
pub async fn status(
    host: &str,
    port: u16,
    protocol_version: u32,
    timeout: Duration,
) -> Result<JavaResponse, Error> {
    tokio::time::timeout(timeout, exchange(host, port, protocol_version)).await?
}

async fn exchange(host: &str, port: u16, protocol_version: u32) -> Result<JavaResponse, Error> {
    let mut stream = TcpStream::connect((host, port)).await?;
    stream.set_nodelay(true)?;
    stream
        .write_all(&java::status_request(host, port, protocol_version)?)
        .await?;

    let mut buf = Vec::with_capacity(4096);
    loop {
        if stream.read_buf(&mut buf).await? == 0 {
            return Err(Error::ConnectionClosed);
        }
        match java::decode_frame(&buf)? {
            Frame::Status(json) => return Ok(serde_json::from_slice(&buf[json])?),
            Frame::Other(id) => trace!(host, port, id, "Waiting past non-status packet"),
            Frame::Incomplete => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::varint;

    fn framed_status(json: &str) -> Vec<u8> {
        let mut body = vec![0x00];
        body.extend(varint::encode(json.len() as u64).unwrap());
        body.extend_from_slice(json.as_bytes());
        let mut out = varint::encode(body.len() as u64).unwrap();
        out.extend(body);
        out
    }

    #[tokio::test]
    async fn test_status_reassembles_byte_by_byte() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let expected = java::status_request("127.0.0.1", port, 758).unwrap();
            let mut request = vec![0; expected.len()];
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(request, expected);
            let response = framed_status(r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":3}}"#);
            for byte in response {
                socket.write_all(&[byte]).await.unwrap();
                socket.flush().await.unwrap();
            }
            // hold the socket open; the client must not wait for a close
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let response = status("127.0.0.1", port, 758, Duration::from_secs(3))
            .await
            .unwrap();
        assert_eq!(response.players.unwrap().online, Some(3));
        server.abort();
    }

    #[tokio::test]
    async fn test_status_early_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0; java::status_request("127.0.0.1", port, 758).unwrap().len()];
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(&[0x05, 0x00]).await.unwrap();
        });
        let result = status("127.0.0.1", port, 758, Duration::from_secs(3)).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_status_times_out_on_silence() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        let result = status("127.0.0.1", port, 758, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(Error::TimedOut)));
        server.abort();
    }
}
