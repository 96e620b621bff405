//! An in-process, scriptable stand-in for a Hell Let Loose RCON server.
//!
//! Tests describe the handshake and command exchanges they expect with
//! methods like [`FakeServer::expect_handshake`], then drive a real
//! `rcon-client` session against [`FakeServer::port`]. Each expectation
//! method returns as soon as it has scheduled its behavior for the next
//! bytes on the wire — it does not block on the client actually sending
//! anything.

use std::{sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rcon_types::frame::{HEADER_LEN, encode_header, xor_mask};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpListener,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, mpsc},
};

#[derive(Deserialize)]
struct WireRequest {
    #[serde(rename = "authToken")]
    #[allow(dead_code)]
    auth_token: String,
    #[allow(dead_code)]
    version: u32,
    name: String,
    #[serde(rename = "contentBody")]
    content_body: String,
}

#[derive(Serialize)]
struct WireResponse<'a> {
    name: &'a str,
    version: u32,
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "statusMessage")]
    status_message: &'a str,
    #[serde(rename = "contentBody")]
    content_body: &'a str,
}

/// A decoded request as seen from the server's side of the wire.
pub struct IncomingRequest {
    /// The request's `request_id`, to be echoed back in the response frame.
    pub request_id: u32,
    /// The command name.
    pub name: String,
    /// The command's content body.
    pub content_body: String,
}

struct Connection {
    write_half: OwnedWriteHalf,
    inbound_rx: mpsc::UnboundedReceiver<IncomingRequest>,
    xor_key: Option<Vec<u8>>,
}

/// A fake RCON server bound to a random local port.
pub struct FakeServer {
    listener: Arc<TcpListener>,
    port: u16,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl FakeServer {
    /// Binds a listener on `127.0.0.1` and an OS-assigned port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("failed to bind fake server");
        let port = listener.local_addr().expect("local_addr").port();
        Self {
            listener: Arc::new(listener),
            port,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// The port this server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accepts the next connection and runs a successful `ServerConnect` /
    /// `Login` handshake against it, installing `key` as the session's XOR
    /// key and `token` as the resulting auth token.
    ///
    /// Asserts that the `Login` request's content body equals
    /// `expected_password`.
    pub async fn expect_handshake(&self, key: &[u8], token: &str, expected_password: &str) {
        let listener = Arc::clone(&self.listener);
        let conn_slot = Arc::clone(&self.conn);
        let key = key.to_vec();
        let token = token.to_owned();
        let expected_password = expected_password.to_owned();
        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.expect("accept failed");
            tracing::debug!(%peer, "fake server accepted connection");
            let _ = stream.set_nodelay(true);
            let (read_half, mut write_half) = stream.into_split();
            let key_cell = Arc::new(Mutex::new(None));
            let (tx, mut rx) = mpsc::unbounded_channel();
            tokio::spawn(reader_task(read_half, Arc::clone(&key_cell), tx));

            let connect_req = rx.recv().await.expect("client never sent ServerConnect");
            assert_eq!(connect_req.name, "ServerConnect");
            send_response(
                &mut write_half,
                None,
                connect_req.request_id,
                "ServerConnect",
                2,
                200,
                "",
                &BASE64.encode(&key),
            )
            .await;
            *key_cell.lock().await = Some(key.clone());

            let login_req = rx.recv().await.expect("client never sent Login");
            assert_eq!(login_req.name, "Login");
            assert_eq!(login_req.content_body, expected_password);
            send_response(
                &mut write_half,
                Some(&key),
                login_req.request_id,
                "Login",
                2,
                200,
                "",
                &token,
            )
            .await;
            tracing::debug!("fake server completed handshake");

            *conn_slot.lock().await = Some(Connection {
                write_half,
                inbound_rx: rx,
                xor_key: Some(key),
            });
        });
    }

    /// Like [`FakeServer::expect_handshake`], but fails the `Login` step
    /// with `401`, matching a wrong password.
    pub async fn expect_handshake_auth_failure(&self, key: &[u8], expected_password: &str) {
        let listener = Arc::clone(&self.listener);
        let key = key.to_vec();
        let expected_password = expected_password.to_owned();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept failed");
            let _ = stream.set_nodelay(true);
            let (read_half, mut write_half) = stream.into_split();
            let key_cell = Arc::new(Mutex::new(None));
            let (tx, mut rx) = mpsc::unbounded_channel();
            tokio::spawn(reader_task(read_half, Arc::clone(&key_cell), tx));

            let connect_req = rx.recv().await.expect("client never sent ServerConnect");
            assert_eq!(connect_req.name, "ServerConnect");
            send_response(
                &mut write_half,
                None,
                connect_req.request_id,
                "ServerConnect",
                2,
                200,
                "",
                &BASE64.encode(&key),
            )
            .await;
            *key_cell.lock().await = Some(key.clone());

            let login_req = rx.recv().await.expect("client never sent Login");
            assert_eq!(login_req.content_body, expected_password);
            send_response(
                &mut write_half,
                Some(&key),
                login_req.request_id,
                "Login",
                2,
                401,
                "invalid password",
                "",
            )
            .await;
        });
    }

    /// Waits for the next request on the already-handshaken connection and
    /// replies to it with a `200` and the given content body.
    ///
    /// Requires [`FakeServer::expect_handshake`] to have already completed.
    pub async fn reply_ok(&self, content_body: &str) {
        let conn_slot = Arc::clone(&self.conn);
        let content_body = content_body.to_owned();
        tokio::spawn(async move {
            wait_for_connection(&conn_slot).await;
            let mut guard = conn_slot.lock().await;
            let conn = guard
                .as_mut()
                .expect("connection present after wait_for_connection");
            let req = conn.inbound_rx.recv().await.expect("missing request");
            send_response(
                &mut conn.write_half,
                conn.xor_key.as_deref(),
                req.request_id,
                &req.name,
                2,
                200,
                "",
                &content_body,
            )
            .await;
        });
    }

    /// Half-closes the already-handshaken connection's write direction,
    /// simulating the server side hanging up. The client observes this as
    /// EOF on its read side.
    ///
    /// Requires [`FakeServer::expect_handshake`] to have already completed.
    pub async fn sever_connection(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_mut() {
            let _ = conn.write_half.shutdown().await;
        }
        *guard = None;
    }

    /// Waits for two requests on the already-handshaken connection and
    /// replies to the second one first, to exercise out-of-order response
    /// delivery. Requires [`FakeServer::expect_handshake`] to have already
    /// completed.
    pub async fn reply_out_of_order(&self) {
        let conn_slot = Arc::clone(&self.conn);
        tokio::spawn(async move {
            wait_for_connection(&conn_slot).await;
            let mut guard = conn_slot.lock().await;
            let conn = guard
                .as_mut()
                .expect("connection present after wait_for_connection");

            let first = conn
                .inbound_rx
                .recv()
                .await
                .expect("missing first request");
            let second = conn
                .inbound_rx
                .recv()
                .await
                .expect("missing second request");
            let (a, b) = if first.name <= second.name {
                (first, second)
            } else {
                (second, first)
            };

            let content_for = |name: &str| if name == "A" { "resp-a" } else { "resp-b" };
            send_response(
                &mut conn.write_half,
                conn.xor_key.as_deref(),
                b.request_id,
                &b.name,
                2,
                200,
                "",
                content_for(&b.name),
            )
            .await;
            send_response(
                &mut conn.write_half,
                conn.xor_key.as_deref(),
                a.request_id,
                &a.name,
                2,
                200,
                "",
                content_for(&a.name),
            )
            .await;
        });
    }
}

async fn wait_for_connection(conn_slot: &Arc<Mutex<Option<Connection>>>) {
    loop {
        if conn_slot.lock().await.is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

async fn reader_task(
    mut read_half: OwnedReadHalf,
    key_cell: Arc<Mutex<Option<Vec<u8>>>>,
    tx: mpsc::UnboundedSender<IncomingRequest>,
) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        let n = match read_half.read(&mut tmp).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&tmp[..n]);

        loop {
            if buf.len() < HEADER_LEN {
                break;
            }
            let request_id = u32::from_le_bytes(buf[0..4].try_into().expect("4 bytes"));
            let body_len = u32::from_le_bytes(buf[4..8].try_into().expect("4 bytes")) as usize;
            let frame_len = HEADER_LEN + body_len;
            if buf.len() < frame_len {
                break;
            }

            let key = key_cell.lock().await.clone();
            let body = xor_mask(&buf[HEADER_LEN..frame_len], key.as_deref());
            if let Ok(wire) = serde_json::from_slice::<WireRequest>(&body) {
                let _ = tx.send(IncomingRequest {
                    request_id,
                    name: wire.name,
                    content_body: wire.content_body,
                });
            }
            buf.drain(..frame_len);
        }
    }
}

async fn send_response(
    write_half: &mut OwnedWriteHalf,
    key: Option<&[u8]>,
    request_id: u32,
    name: &str,
    version: u32,
    status_code: u16,
    status_message: &str,
    content_body: &str,
) {
    let body = serde_json::to_vec(&WireResponse {
        name,
        version,
        status_code,
        status_message,
        content_body,
    })
    .expect("fake server response is always encodable");
    let masked = xor_mask(&body, key);
    let header = encode_header(request_id, masked.len() as u32);
    write_half
        .write_all(&header)
        .await
        .expect("fake server write failed");
    write_half
        .write_all(&masked)
        .await
        .expect("fake server write failed");
}
