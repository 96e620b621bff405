//! A single-use connection to an RCON server.

use std::time::Duration;

use rcon_types::RconBody;

use crate::{commands::RconCommands, error::RconError, session::ProtocolSession};

/// A single connection to an RCON server.
///
/// `RconConnection`s are single-use: once disconnected, for any reason,
/// they cannot be reused. [`crate::client::Rcon`] builds on top of this to
/// add reconnection, and [`crate::pool::RconPool`] to add worker reuse.
pub struct RconConnection {
    session: ProtocolSession,
}

impl RconConnection {
    /// Connects and authenticates against `host:port`.
    pub async fn connect(
        host: &str,
        port: u16,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, RconError> {
        let session = ProtocolSession::connect(host, port, password, timeout).await?;
        Ok(Self { session })
    }

    /// Whether the underlying session still believes itself connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Suspends until the connection is lost, for any reason.
    pub async fn wait_until_disconnected(&self) {
        self.session.wait_until_disconnected().await;
    }

    /// Closes the connection. Idempotent.
    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    /// Sends a command and returns its content body, or an error if the
    /// connection was already lost or the server rejected the command.
    pub async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        if !self.session.is_connected() {
            return Err(RconError::ConnectionLost(None));
        }
        let response = self.session.execute(command, version, body).await?;
        if !response.status_code.is_ok() {
            return Err(RconError::Command {
                status_code: response.status_code.code(),
                status_message: response.status_message,
            });
        }
        Ok(response.content_body)
    }
}

impl RconCommands for RconConnection {
    async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        RconConnection::execute(self, command, version, body).await
    }
}
