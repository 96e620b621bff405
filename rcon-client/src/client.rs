//! A resilient RCON client that (re)connects on demand.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use futures::future::{BoxFuture, FutureExt, Shared};
use rcon_types::RconBody;
use tokio::sync::Mutex;

use crate::{commands::RconCommands, connection::RconConnection, error::RconError};

/// Default session timeout applied to commands executed through [`Rcon`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type ConnectResult = Result<Arc<RconConnection>, RconError>;
type ConnectFuture = Shared<BoxFuture<'static, ConnectResult>>;

enum Slot {
    Idle,
    Pending(ConnectFuture),
    Ready(Arc<RconConnection>),
}

/// An RCON client that connects lazily and reconnects after repeated
/// command failures.
///
/// Only one connection is attempted at a time: concurrent callers that
/// arrive while a connection attempt is already in flight all observe the
/// result of that same attempt rather than racing to open their own.
pub struct Rcon {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
    /// After this many consecutive network failures, the connection is
    /// dropped and the next command triggers a fresh one. `0` disables
    /// this behavior.
    reconnect_after_failures: u32,
    slot: Mutex<Slot>,
    failure_count: AtomicU32,
}

impl Rcon {
    /// Builds a client for `host:port`. No connection is made until the
    /// first command is executed.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            reconnect_after_failures: 3,
            slot: Mutex::new(Slot::Idle),
            failure_count: AtomicU32::new(0),
        }
    }

    /// Overrides the per-command timeout (default: [`DEFAULT_TIMEOUT`]).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the consecutive-failure threshold that triggers a
    /// reconnect (default: `3`). `0` disables the behavior entirely.
    pub fn with_reconnect_after_failures(mut self, failures: u32) -> Self {
        self.reconnect_after_failures = failures;
        self
    }

    async fn get_connection(&self) -> ConnectResult {
        {
            let mut guard = self.slot.lock().await;
            if let Slot::Ready(conn) = &*guard {
                if conn.is_connected() {
                    return Ok(Arc::clone(conn));
                }
                *guard = Slot::Idle;
            }
        }

        let fut = {
            let mut guard = self.slot.lock().await;
            match &*guard {
                Slot::Pending(fut) => fut.clone(),
                _ => {
                    let host = self.host.clone();
                    let port = self.port;
                    let password = self.password.clone();
                    let timeout = self.timeout;
                    let fut: ConnectFuture = async move {
                        RconConnection::connect(&host, port, &password, timeout)
                            .await
                            .map(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *guard = Slot::Pending(fut.clone());
                    fut
                }
            }
        };

        let result = fut.await;
        let mut guard = self.slot.lock().await;
        match &result {
            Ok(conn) => *guard = Slot::Ready(Arc::clone(conn)),
            // Only clear the slot if nobody else has already started a
            // fresh attempt in the meantime.
            Err(_) if matches!(&*guard, Slot::Pending(_)) => *guard = Slot::Idle,
            Err(_) => {}
        }
        result
    }

    /// Whether a live connection is currently held. Never blocks; returns
    /// `false` if a connection attempt is in flight or the state is
    /// momentarily locked by another caller.
    pub fn is_connected(&self) -> bool {
        match self.slot.try_lock() {
            Ok(guard) => matches!(&*guard, Slot::Ready(conn) if conn.is_connected()),
            Err(_) => false,
        }
    }

    /// Ensures a connection exists, establishing one if necessary.
    pub async fn wait_until_connected(&self) -> Result<(), RconError> {
        self.get_connection().await?;
        Ok(())
    }

    /// Drops the current connection, if any, and resets the failure
    /// counter. The next command establishes a fresh connection.
    pub async fn disconnect(&self) {
        let mut guard = self.slot.lock().await;
        if let Slot::Ready(conn) = &*guard {
            conn.disconnect().await;
        }
        *guard = Slot::Idle;
        self.failure_count.store(0, Ordering::SeqCst);
    }

    /// Runs `f` against a guaranteed-live connection, then disconnects
    /// once `f` completes, regardless of its outcome.
    ///
    /// Useful for scoping a burst of commands to a single connection, then
    /// releasing it immediately rather than waiting for the usual
    /// failure-based reconnect.
    pub async fn with_connection<F, Fut, T>(&self, f: F) -> Result<T, RconError>
    where
        F: FnOnce(Arc<RconConnection>) -> Fut,
        Fut: Future<Output = T>,
    {
        let conn = self.get_connection().await?;
        let result = f(conn).await;
        self.disconnect().await;
        Ok(result)
    }

    /// Sends a command, reconnecting first if necessary.
    ///
    /// Consecutive transport-class failures (timeouts, I/O errors) count
    /// toward `reconnect_after_failures`; once the threshold is reached,
    /// the connection is dropped so the next call starts fresh. The
    /// counter is only reset by an explicit [`Rcon::disconnect`] — a
    /// successful command does not reset it, since a successful command
    /// is also the case that proves the threshold was never reached.
    pub async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        let conn = self.get_connection().await?;
        match conn.execute(command, version, body).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if e.counts_as_network_failure() {
                    let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::debug!(failures, threshold = self.reconnect_after_failures, "command failed");
                    if self.reconnect_after_failures > 0 && failures >= self.reconnect_after_failures
                    {
                        tracing::warn!(failures, "consecutive-failure threshold reached, reconnecting");
                        self.disconnect().await;
                    }
                }
                Err(e)
            }
        }
    }
}

impl RconCommands for Rcon {
    async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        Rcon::execute(self, command, version, body).await
    }
}

#[cfg(test)]
mod tests {
    use rcon_test_utils::FakeServer;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_share_one_connect_attempt() {
        let server = FakeServer::start().await;
        server.expect_handshake(b"K", "T", "pw").await;

        let client = Arc::new(Rcon::new("127.0.0.1", server.port(), "pw"));
        let (a, b) = tokio::join!(
            Arc::clone(&client).wait_until_connected_owned(),
            client.wait_until_connected()
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(client.is_connected());
    }
}

#[cfg(test)]
impl Rcon {
    async fn wait_until_connected_owned(self: Arc<Self>) -> Result<(), RconError> {
        self.wait_until_connected().await
    }
}
