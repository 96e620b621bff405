//! Fatal, session-wide framing errors.

/// An error that invalidates the entire session it occurred on.
///
/// Unlike an application error (a non-`200` status code), a [`FrameError`]
/// means the byte stream itself can no longer be trusted, so the session
/// that produced it must be torn down.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The response body was not valid JSON, or did not match the expected
    /// shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The frame's declared body length exceeded the configured maximum.
    #[error("frame body of {len} bytes exceeds the maximum of {max} bytes")]
    BodyTooLarge {
        /// The length declared in the frame header.
        len: u32,
        /// The configured maximum.
        max: u32,
    },
}
