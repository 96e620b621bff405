//! The error taxonomy surfaced by every layer of this crate.

use std::sync::Arc;

use rcon_types::FrameError;

/// What caused a session to stop accepting requests.
///
/// Cloned into every waiter that was in flight when the session went down,
/// so all of them observe the same cause.
#[derive(Debug, Clone)]
pub enum DisconnectCause {
    /// The connection was closed without an underlying error — either the
    /// caller asked to disconnect, or the peer closed cleanly.
    Graceful,
    /// The connection failed with the given error.
    Lost(Arc<RconError>),
}

/// Errors produced by the RCON transport and client.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum RconError {
    /// The host could not be resolved, or the TCP connect attempt timed
    /// out.
    #[error("could not resolve or reach {0}")]
    ResolveFailed(String),

    /// The server actively refused the TCP connection.
    #[error("connection refused on port {0}")]
    ConnectionRefused(u16),

    /// The `Login` handshake step did not return status `200`.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The connection was closed while a request was outstanding.
    #[error("connection lost{}", .0.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    ConnectionLost(Option<Arc<RconError>>),

    /// The request's session timeout elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-`200` status code.
    #[error("server returned {status_code}: {status_message}")]
    Command {
        /// The response's status code.
        status_code: u16,
        /// The response's status message.
        status_message: String,
    },

    /// A response violated a type or shape invariant the protocol
    /// guarantees (e.g. the `ServerConnect` response body was not a
    /// string).
    #[error("unexpected message: {0}")]
    Message(String),

    /// A frame could not be parsed; fatal to the session that produced it.
    #[error("protocol error: {0}")]
    Protocol(Arc<FrameError>),

    /// Any other I/O failure on the transport.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),
}

impl From<FrameError> for RconError {
    fn from(value: FrameError) -> Self {
        RconError::Protocol(Arc::new(value))
    }
}

impl From<std::io::Error> for RconError {
    fn from(value: std::io::Error) -> Self {
        RconError::Io(Arc::new(value))
    }
}

impl RconError {
    /// Whether this error counts toward the resilient client's
    /// consecutive-failure threshold.
    ///
    /// Only transport-class failures count; application errors
    /// ([`RconError::Command`], [`RconError::Message`]) do not, since they
    /// say nothing about the health of the connection.
    pub fn counts_as_network_failure(&self) -> bool {
        matches!(self, RconError::Timeout | RconError::Io(_))
    }
}
