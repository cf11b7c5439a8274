//! WebSocket upgrade handshake.
//!
//! Only the `Sec-WebSocket-Key` header is inspected. Method, path, version and
//! every other header are accepted as-is.

use std::time::Duration;

use base64::prelude::*;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::ServerConfig;

/// Fixed GUID appended to the client nonce (RFC 6455 section 1.3).
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const KEY_HEADER: &str = "Sec-WebSocket-Key:";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const LINE_TERMINATOR: &str = "\r\n";
const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum HandshakeError {
    /// No bytes arrived within the allowed wait
    #[error("no handshake bytes received within {0:?}")]
    Timeout(Duration),

    /// The request grew past the ceiling before its headers ended
    #[error("handshake request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// The peer closed the stream before finishing the request
    #[error("connection closed during handshake")]
    ConnectionClosed,

    /// The request has no usable `Sec-WebSocket-Key` header
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,

    #[error("handshake I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied while reading the upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeLimits {
    pub max_request_bytes: usize,
    pub timeout: Duration,
}

impl From<&ServerConfig> for HandshakeLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_request_bytes: config.max_handshake_bytes,
            timeout: config.handshake_timeout,
        }
    }
}

impl Default for HandshakeLimits {
    fn default() -> Self {
        (&ServerConfig::default()).into()
    }
}

/// Result of a successful upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upgraded {
    pub accept_token: String,
    /// Bytes received after the request headers; they belong to the first frames
    pub leftover: Vec<u8>,
}

/// Derive the `Sec-WebSocket-Accept` token for a client nonce.
pub fn accept_token(key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.as_bytes());
    sha1.update(WEBSOCKET_GUID.as_bytes());
    BASE64_STANDARD.encode(sha1.finalize())
}

/// Find the `Sec-WebSocket-Key` value in a request header block.
///
/// The header name is matched case-sensitively; the value ends at the next CRLF.
pub fn extract_key(headers: &str) -> Option<&str> {
    let start = headers.find(KEY_HEADER)? + KEY_HEADER.len();
    let value = &headers[start..];
    let end = value.find(LINE_TERMINATOR).unwrap_or(value.len());
    let key = value[..end].trim_start();
    (!key.is_empty()).then_some(key)
}

/// The `101 Switching Protocols` response for a given accept token.
pub fn switching_protocols_response(accept_token: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_token
    )
}

/// Read the upgrade request from `stream` and answer it.
///
/// Fails if the request is not complete within `limits`, lacks the key
/// header, or the response cannot be written in full.
pub async fn negotiate<S>(stream: &mut S, limits: HandshakeLimits) -> Result<Upgraded, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    let header_end = loop {
        let read = tokio::time::timeout(limits.timeout, stream.read(&mut chunk))
            .await
            .map_err(|_| HandshakeError::Timeout(limits.timeout))??;
        if read == 0 {
            return Err(HandshakeError::ConnectionClosed);
        }

        // A terminator may straddle two reads
        let search_from = request.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        request.extend_from_slice(&chunk[..read]);

        if let Some(pos) = find_terminator(&request[search_from..]) {
            let end = search_from + pos + HEADER_TERMINATOR.len();
            if end > limits.max_request_bytes {
                return Err(HandshakeError::RequestTooLarge {
                    limit: limits.max_request_bytes,
                });
            }
            break end;
        }
        if request.len() > limits.max_request_bytes {
            return Err(HandshakeError::RequestTooLarge {
                limit: limits.max_request_bytes,
            });
        }
    };

    let headers = String::from_utf8_lossy(&request[..header_end]);
    let key = extract_key(&headers).ok_or(HandshakeError::MissingKey)?;
    let accept_token = accept_token(key);

    stream
        .write_all(switching_protocols_response(&accept_token).as_bytes())
        .await?;
    stream.flush().await?;

    Ok(Upgraded {
        accept_token,
        leftover: request.split_off(header_end),
    })
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";
    const SAMPLE_ACCEPT: &str = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";

    fn sample_request() -> String {
        format!(
            "GET /chat HTTP/1.1\r\n\
             Host: server.example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {}\r\n\
             Sec-WebSocket-Version: 13\r\n\r\n",
            SAMPLE_KEY
        )
    }

    fn short_limits() -> HandshakeLimits {
        HandshakeLimits {
            max_request_bytes: 16 * 1024,
            timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_accept_token_rfc_example() {
        // テスト項目: RFC 6455 のサンプル鍵から規定のトークンが導出される
        // given (前提条件):

        // when (操作):
        let token = accept_token(SAMPLE_KEY);

        // then (期待する結果):
        assert_eq!(token, SAMPLE_ACCEPT);
    }

    #[test]
    fn test_extract_key_trims_leading_whitespace_only() {
        // テスト項目: ヘッダー値の先頭の空白だけが取り除かれ、末尾の空白は残る
        // given (前提条件):
        let headers = "GET / HTTP/1.1\r\nSec-WebSocket-Key:   abc==  \r\n\r\n";

        // when (操作):
        let key = extract_key(headers);

        // then (期待する結果):
        assert_eq!(key, Some("abc==  "));
    }

    #[test]
    fn test_extract_key_is_case_sensitive() {
        // テスト項目: ヘッダー名は大文字小文字を区別して照合される
        // given (前提条件):
        let headers = "GET / HTTP/1.1\r\nsec-websocket-key: abc==\r\n\r\n";

        // when (操作):
        let key = extract_key(headers);

        // then (期待する結果):
        assert_eq!(key, None);
    }

    #[test]
    fn test_extract_key_rejects_empty_value() {
        // テスト項目: 値が空のヘッダーは鍵なしとして扱われる
        // given (前提条件):
        let headers = "GET / HTTP/1.1\r\nSec-WebSocket-Key: \r\n\r\n";

        // when (操作):
        let key = extract_key(headers);

        // then (期待する結果):
        assert_eq!(key, None);
    }

    #[tokio::test]
    async fn test_negotiate_writes_exact_response() {
        // テスト項目: 正しいリクエストに対して規定のレスポンスがそのまま返される
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        client.write_all(sample_request().as_bytes()).await.unwrap();

        // when (操作):
        let upgraded = negotiate(&mut server, short_limits()).await.unwrap();

        // then (期待する結果):
        let expected = "HTTP/1.1 101 Switching Protocols\r\n\
                        Upgrade: websocket\r\n\
                        Connection: Upgrade\r\n\
                        Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n";
        let mut response = vec![0u8; expected.len()];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(String::from_utf8(response).unwrap(), expected);
        assert_eq!(upgraded.accept_token, SAMPLE_ACCEPT);
        assert!(upgraded.leftover.is_empty());
    }

    #[tokio::test]
    async fn test_negotiate_across_split_reads() {
        // テスト項目: リクエストが細切れに届いても終端を検出できる
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        let request = sample_request();
        let writer = tokio::spawn(async move {
            for piece in request.as_bytes().chunks(3) {
                client.write_all(piece).await.unwrap();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            client
        });

        // when (操作):
        let upgraded = negotiate(&mut server, short_limits()).await;

        // then (期待する結果):
        assert_eq!(upgraded.unwrap().accept_token, SAMPLE_ACCEPT);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_negotiate_keeps_leftover_bytes() {
        // テスト項目: ヘッダー終端より後のバイトは leftover として返される
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        let mut bytes = sample_request().into_bytes();
        bytes.extend_from_slice(&[0x81, 0x80, 1, 2, 3, 4]);
        client.write_all(&bytes).await.unwrap();

        // when (操作):
        let upgraded = negotiate(&mut server, short_limits()).await.unwrap();

        // then (期待する結果):
        assert_eq!(upgraded.leftover, vec![0x81, 0x80, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_negotiate_missing_key() {
        // テスト項目: 鍵ヘッダーがない場合は失敗し、レスポンスは送られない
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")
            .await
            .unwrap();

        // when (操作):
        let result = negotiate(&mut server, short_limits()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(HandshakeError::MissingKey)));
        drop(server);
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_negotiate_times_out_without_terminator() {
        // テスト項目: 終端が届かないまま待機時間を過ぎると Timeout になる
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

        // when (操作):
        let result = negotiate(&mut server, short_limits()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(HandshakeError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_negotiate_rejects_oversized_request() {
        // テスト項目: 上限を超えるリクエストは RequestTooLarge になる
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        let limits = HandshakeLimits {
            max_request_bytes: 64,
            timeout: Duration::from_millis(100),
        };
        let padding = format!("X-Padding: {}\r\n", "a".repeat(128));
        client.write_all(padding.as_bytes()).await.unwrap();

        // when (操作):
        let result = negotiate(&mut server, limits).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(HandshakeError::RequestTooLarge { limit: 64 })
        ));
    }

    #[tokio::test]
    async fn test_negotiate_peer_closes_early() {
        // テスト項目: リクエスト途中で切断されると ConnectionClosed になる
        // given (前提条件):
        let (mut server, mut client) = tokio::io::duplex(64 * 1024);
        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        drop(client);

        // when (操作):
        let result = negotiate(&mut server, short_limits()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(HandshakeError::ConnectionClosed)));
    }
}
