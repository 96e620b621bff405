//! A single live TCP connection and its framing/demultiplexing state.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rcon_types::{FrameReader, RconBody, RconRequest, RconResponse, frame::pack_request, frame::xor_mask};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, oneshot, watch},
};

use crate::error::{DisconnectCause, RconError};

/// Budget for establishing the TCP connection, independent of the
/// per-command timeout applied once connected.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

type Waiter = oneshot::Sender<Result<RconResponse, RconError>>;

#[derive(Debug)]
struct SessionState {
    waiters: Mutex<HashMap<u32, Waiter>>,
    xor_key: Mutex<Option<Vec<u8>>>,
    auth_token: Mutex<String>,
    counter: AtomicU32,
    disconnect: watch::Sender<Option<DisconnectCause>>,
}

/// A single live TCP connection to the RCON server, plus its codec state.
///
/// A session is single-use: once it disconnects, it must be discarded.
/// Callers normally don't hold a `ProtocolSession` directly — see
/// [`crate::connection::RconConnection`] for the facade that enforces
/// this.
#[derive(Debug)]
pub struct ProtocolSession {
    writer: Mutex<OwnedWriteHalf>,
    shared: Arc<SessionState>,
    timeout: Duration,
}

impl ProtocolSession {
    /// Connects to `host:port`, then runs the two-step handshake:
    /// `ServerConnect` (installs the XOR key) followed by `Login`
    /// (exchanges the password for an auth token).
    pub async fn connect(
        host: &str,
        port: u16,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, RconError> {
        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
        {
            Err(_elapsed) => return Err(RconError::ResolveFailed(host.to_owned())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(RconError::ConnectionRefused(port));
            }
            Ok(Err(e)) => return Err(RconError::ResolveFailed(format!("{host}: {e}"))),
            Ok(Ok(stream)) => stream,
        };
        stream.set_nodelay(true)?;
        tracing::info!(host, port, "connected, starting handshake");

        let (read_half, write_half) = stream.into_split();
        let (disconnect_tx, _) = watch::channel(None);
        let shared = Arc::new(SessionState {
            waiters: Mutex::new(HashMap::new()),
            xor_key: Mutex::new(None),
            auth_token: Mutex::new(String::new()),
            counter: AtomicU32::new(0),
            disconnect: disconnect_tx,
        });

        tokio::spawn(reader_task(read_half, Arc::clone(&shared)));

        let session = Self {
            writer: Mutex::new(write_half),
            shared,
            timeout,
        };
        session.handshake(password).await?;
        Ok(session)
    }

    async fn handshake(&self, password: &str) -> Result<(), RconError> {
        let xorkey_resp = self.execute("ServerConnect", 2, RconBody::Text(String::new())).await?;
        if xorkey_resp.status_code.code() != 200 {
            return Err(RconError::Command {
                status_code: xorkey_resp.status_code.code(),
                status_message: xorkey_resp.status_message,
            });
        }
        let xor_key = BASE64
            .decode(xorkey_resp.content_body.as_bytes())
            .map_err(|e| RconError::Message(format!("ServerConnect content_body is not valid base64: {e}")))?;
        tracing::debug!(key_len = xor_key.len(), "received xor key");
        *self.shared.xor_key.lock().await = Some(xor_key);

        let login_resp = self.execute("Login", 2, RconBody::Text(password.to_owned())).await?;
        if login_resp.status_code.code() != 200 {
            let cause = RconError::AuthFailed(login_resp.status_message.clone());
            self.disconnect().await;
            return Err(cause);
        }
        tracing::info!("authenticated");
        *self.shared.auth_token.lock().await = login_resp.content_body;
        Ok(())
    }

    /// Sends a command and waits (up to this session's timeout) for its
    /// response.
    pub async fn execute(
        &self,
        name: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<RconResponse, RconError> {
        if let Some(cause) = self.shared.disconnect.subscribe().borrow().clone() {
            return Err(match cause {
                DisconnectCause::Graceful => RconError::ConnectionLost(None),
                DisconnectCause::Lost(e) => RconError::ConnectionLost(Some(e)),
            });
        }

        let request_id = self.shared.counter.fetch_add(1, Ordering::SeqCst);
        let auth_token = self.shared.auth_token.lock().await.clone();
        let request = RconRequest::new(request_id, name, version, auth_token, body);

        let (rx, write_result) = {
            let (header, body) = pack_request(&request);
            let key = self.shared.xor_key.lock().await.clone();
            let masked = xor_mask(&body, key.as_deref());

            let (tx, rx) = oneshot::channel();
            self.shared.waiters.lock().await.insert(request_id, tx);

            let mut frame = header;
            frame.extend_from_slice(&masked);
            let mut writer = self.writer.lock().await;
            (rx, writer.write_all(&frame).await)
        };

        if let Err(e) = write_result {
            self.shared.waiters.lock().await.remove(&request_id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            // The sender was dropped without sending: only happens if the
            // reader task panicked, which we treat like any other loss.
            Ok(Err(_)) => Err(RconError::ConnectionLost(None)),
            Err(_elapsed) => {
                self.shared.waiters.lock().await.remove(&request_id);
                Err(RconError::Timeout)
            }
        }
    }

    /// Closes the transport. Idempotent; safe to call more than once.
    pub async fn disconnect(&self) {
        // Shutting down our write half causes the peer to observe EOF and,
        // in turn, our own reader task to observe EOF — which drives the
        // graceful fan-out in `reader_task`, so there's no separate
        // bookkeeping to do here beyond closing the socket.
        let _ = self.writer.lock().await.shutdown().await;
        let _ = self.shared.disconnect.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(DisconnectCause::Graceful);
                true
            } else {
                false
            }
        });
    }

    /// Whether the session still believes itself connected.
    pub fn is_connected(&self) -> bool {
        self.shared.disconnect.subscribe().borrow().is_none()
    }

    /// Suspends until the connection is lost, for any reason.
    pub async fn wait_until_disconnected(&self) {
        let mut rx = self.shared.disconnect.subscribe();
        let _ = rx.wait_for(|cause| cause.is_some()).await;
    }
}

async fn reader_task(mut read_half: OwnedReadHalf, shared: Arc<SessionState>) {
    let mut frames = FrameReader::new();
    let mut buf = [0u8; 8192];

    let cause = loop {
        match read_half.read(&mut buf).await {
            Ok(0) => break DisconnectCause::Graceful,
            Ok(n) => {
                frames.push(&buf[..n]);
                let key = shared.xor_key.lock().await.clone();
                match frames.parse_frames(key.as_deref()) {
                    Ok(responses) => {
                        for (request_id, response) in responses {
                            deliver(&shared, request_id, response).await;
                        }
                    }
                    Err(e) => break DisconnectCause::Lost(Arc::new(e.into())),
                }
            }
            Err(e) => break DisconnectCause::Lost(Arc::new(e.into())),
        }
    };

    let waiters = std::mem::take(&mut *shared.waiters.lock().await);
    let error = match &cause {
        DisconnectCause::Graceful => None,
        DisconnectCause::Lost(e) => Some(Arc::clone(e)),
    };
    for (_, waiter) in waiters {
        let _ = waiter.send(Err(RconError::ConnectionLost(error.clone())));
    }

    if let DisconnectCause::Lost(e) = &cause {
        tracing::warn!(error = %e, "connection lost");
    } else {
        tracing::info!("connection closed");
    }
    let _ = shared.disconnect.send_if_modified(|current| {
        if current.is_none() {
            *current = Some(cause);
            true
        } else {
            false
        }
    });
}

async fn deliver(shared: &SessionState, request_id: u32, response: RconResponse) {
    let waiter = shared.waiters.lock().await.remove(&request_id);
    match waiter {
        Some(tx) => {
            if tx.send(Ok(response)).is_err() {
                tracing::debug!(request_id, "waiter was cancelled, dropping late response");
            }
        }
        None => {
            tracing::warn!(request_id, "no waiter for response, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use rcon_test_utils::FakeServer;

    use super::*;

    #[tokio::test]
    async fn happy_handshake_sets_key_and_token() {
        let server = FakeServer::start().await;
        server.expect_handshake(b"KEYBYTES", "TOKEN", "pw").await;

        let session = ProtocolSession::connect("127.0.0.1", server.port(), "pw", Duration::from_secs(2))
            .await
            .unwrap();
        assert!(session.is_connected());
        assert_eq!(
            session.shared.xor_key.lock().await.as_deref(),
            Some(b"KEYBYTES".as_slice())
        );
        assert_eq!(*session.shared.auth_token.lock().await, "TOKEN");
    }

    #[tokio::test]
    async fn auth_failure_closes_session() {
        let server = FakeServer::start().await;
        server.expect_handshake_auth_failure(b"KEYBYTES", "pw").await;

        let err = ProtocolSession::connect("127.0.0.1", server.port(), "pw", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RconError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn interleaved_responses_route_to_correct_caller() {
        let server = FakeServer::start().await;
        server.expect_handshake(b"K", "T", "pw").await;
        let session =
            ProtocolSession::connect("127.0.0.1", server.port(), "pw", Duration::from_secs(2))
                .await
                .unwrap();

        server.reply_out_of_order().await;

        let a = session.execute("A", 2, "a");
        let b = session.execute("B", 2, "b");
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap().content_body, "resp-a");
        assert_eq!(b.unwrap().content_body, "resp-b");
    }
}
