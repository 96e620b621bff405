#![deny(missing_docs)]
//! Wire-level type definitions and the framing codec for the Hell Let Loose
//! RCON protocol.
//!
//! This crate groups together everything that is needed to turn an
//! `execute(name, version, body)` call into bytes on a TCP socket and back,
//! without knowing anything about sockets, retries or authentication. It
//! provides:
//!
//! * [`request`] — the outgoing [`request::RconRequest`] type and its wire
//!   encoding.
//! * [`response`] — the incoming [`response::RconResponse`] type, its wire
//!   decoding, and the [`response::RconStatus`] status codes.
//! * [`frame`] — the length-prefixed header, the repeating-XOR body mask,
//!   and [`frame::FrameReader`], the resumable frame parser used by the
//!   session layer.
//! * [`error`] — [`error::FrameError`], the taxonomy of fatal, session-wide
//!   framing failures.

pub mod error;
pub mod frame;
pub mod request;
pub mod response;

pub use error::FrameError;
pub use frame::FrameReader;
pub use request::{RconBody, RconRequest};
pub use response::{RconResponse, RconStatus};
