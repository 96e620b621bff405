//! The incoming response type and its wire decoding.

use serde::Deserialize;

use crate::error::FrameError;

/// The status code carried by every response.
///
/// The game server only ever sends these four values; an unrecognized
/// status code is kept around verbatim via [`RconStatus::Other`] rather
/// than treated as a decode failure, since a future server version adding
/// a fifth status should not be fatal to an otherwise-parseable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RconStatus {
    /// `200` — the command succeeded.
    Ok,
    /// `400` — the request was malformed.
    BadRequest,
    /// `401` — the request was not authenticated, or authentication failed.
    Unauthorized,
    /// `500` — the server failed to execute the command.
    InternalError,
    /// Any other status code, preserved verbatim.
    Other(u16),
}

impl RconStatus {
    /// Whether this status represents success (`200`).
    pub fn is_ok(self) -> bool {
        matches!(self, RconStatus::Ok)
    }

    /// The raw numeric status code.
    pub fn code(self) -> u16 {
        match self {
            RconStatus::Ok => 200,
            RconStatus::BadRequest => 400,
            RconStatus::Unauthorized => 401,
            RconStatus::InternalError => 500,
            RconStatus::Other(code) => code,
        }
    }
}

impl From<u16> for RconStatus {
    fn from(code: u16) -> Self {
        match code {
            200 => RconStatus::Ok,
            400 => RconStatus::BadRequest,
            401 => RconStatus::Unauthorized,
            500 => RconStatus::InternalError,
            other => RconStatus::Other(other),
        }
    }
}

/// One incoming RCON response, paired to its request by `request_id`.
#[derive(Debug, Clone)]
pub struct RconResponse {
    /// The `request_id` of the request this response answers.
    pub request_id: u32,
    /// The command name echoed back by the server.
    pub name: String,
    /// The protocol version echoed back by the server.
    pub version: u32,
    /// The outcome of the command.
    pub status_code: RconStatus,
    /// A human-readable status message, often empty on success.
    pub status_message: String,
    /// The raw response payload, possibly empty, possibly containing JSON.
    ///
    /// The transport never interprets this value; command implementations
    /// parse it according to their own expected shape.
    pub content_body: String,
}

/// The on-the-wire shape of a response body.
#[derive(Deserialize)]
struct WireResponseBody {
    name: String,
    version: u32,
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "statusMessage")]
    status_message: String,
    #[serde(rename = "contentBody")]
    content_body: String,
}

impl RconResponse {
    /// Decodes a response from its unmasked body bytes.
    pub fn unpack(request_id: u32, body: &[u8]) -> Result<Self, FrameError> {
        let wire: WireResponseBody = serde_json::from_slice(body)?;
        Ok(Self {
            request_id,
            name: wire.name,
            version: wire.version,
            status_code: wire.status_code.into(),
            status_message: wire.status_message,
            content_body: wire.content_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_zero_length_body_to_empty_content() {
        let body = br#"{"name":"Login","version":2,"statusCode":200,"statusMessage":"","contentBody":""}"#;
        let resp = RconResponse::unpack(5, body).unwrap();
        assert_eq!(resp.request_id, 5);
        assert_eq!(resp.content_body, "");
        assert!(resp.status_code.is_ok());
    }

    #[test]
    fn preserves_unknown_status_codes() {
        let body = br#"{"name":"X","version":2,"statusCode":418,"statusMessage":"teapot","contentBody":""}"#;
        let resp = RconResponse::unpack(0, body).unwrap();
        assert_eq!(resp.status_code, RconStatus::Other(418));
        assert_eq!(resp.status_code.code(), 418);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RconResponse::unpack(0, b"not json").unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
    }
}
