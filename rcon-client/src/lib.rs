//! A resilient client for the Hell Let Loose RCON protocol.
//!
//! [`connection::RconConnection`] wraps a single, single-use TCP session.
//! [`client::Rcon`] builds reconnect-on-demand behavior on top of it, and
//! is the type most callers want. [`pool::RconPool`] instead keeps several
//! connections open at once for concurrent command execution. All three
//! implement [`commands::RconCommands`], the game's command surface.

pub mod client;
pub mod commands;
pub mod connection;
pub mod error;
pub mod pool;
pub mod responses;
mod session;

pub use client::Rcon;
pub use commands::RconCommands;
pub use connection::RconConnection;
pub use error::{DisconnectCause, RconError};
pub use pool::RconPool;

/// The common lifecycle every top-level RCON client exposes, independent
/// of how it manages its underlying connection(s).
///
/// Implemented by [`Rcon`]. [`RconPool`] deliberately does not implement
/// this: a pool has no single connection whose lifecycle "is_connected"
/// or "disconnect" could refer to. Scoping a burst of commands to one
/// connection, as [`Rcon::with_connection`] does, isn't part of this
/// trait either, since its generic callback parameter isn't object-safe;
/// reach for it directly on a concrete [`Rcon`] when you need it.
///
/// [`RconCommands::execute`]'s generic body parameter means this trait
/// can't be used as `dyn RconClient`; callers needing to abstract over
/// client implementations should be generic over `impl RconClient`
/// instead.
#[allow(async_fn_in_trait)]
pub trait RconClient: RconCommands + Send + Sync {
    /// Whether a live connection is currently held.
    fn is_connected(&self) -> bool;

    /// Ensures a connection exists, establishing one if necessary.
    async fn wait_until_connected(&self) -> Result<(), RconError>;

    /// Drops the current connection, if any.
    async fn disconnect(&self);
}

impl RconClient for Rcon {
    fn is_connected(&self) -> bool {
        Rcon::is_connected(self)
    }

    async fn wait_until_connected(&self) -> Result<(), RconError> {
        Rcon::wait_until_connected(self).await
    }

    async fn disconnect(&self) {
        Rcon::disconnect(self).await;
    }
}
