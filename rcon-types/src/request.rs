//! The outgoing request type and its wire encoding.

use serde::Serialize;

/// The payload of a request's `contentBody` field.
///
/// The wire format always carries `contentBody` as a JSON string. A
/// [`RconBody::Json`] value is serialized to a compact JSON string first,
/// and that string becomes the `contentBody` field; a [`RconBody::Text`]
/// value is used as-is.
#[derive(Debug, Clone)]
pub enum RconBody {
    /// A body that is already a plain string (possibly empty).
    Text(String),
    /// A structured body to be compactly JSON-encoded before sending.
    Json(serde_json::Value),
}

impl RconBody {
    /// Renders this body into the string that belongs in `contentBody`.
    ///
    /// # Panics
    ///
    /// Panics if a [`RconBody::Json`] value cannot be serialized, which can
    /// only happen for values containing non-finite floats or non-string
    /// map keys — neither of which this crate ever constructs.
    pub fn into_content_body(self) -> String {
        match self {
            RconBody::Text(s) => s,
            RconBody::Json(value) => {
                serde_json::to_string(&value).expect("RCON command bodies are always encodable")
            }
        }
    }
}

impl From<String> for RconBody {
    fn from(value: String) -> Self {
        RconBody::Text(value)
    }
}

impl From<&str> for RconBody {
    fn from(value: &str) -> Self {
        RconBody::Text(value.to_owned())
    }
}

impl From<serde_json::Value> for RconBody {
    fn from(value: serde_json::Value) -> Self {
        RconBody::Json(value)
    }
}

impl Default for RconBody {
    fn default() -> Self {
        RconBody::Text(String::new())
    }
}

/// One outgoing RCON request.
///
/// A request is immutable once built: the session assigns its
/// [`RconRequest::request_id`] and the [`request_id`](Self::request_id) is
/// never reused within the same session.
#[derive(Debug, Clone)]
pub struct RconRequest {
    /// The connection-unique identifier used to pair this request with its
    /// response.
    pub request_id: u32,
    /// The command name, e.g. `"Login"` or `"GetPlayers"`.
    pub name: String,
    /// The protocol version of this command (not the wire version).
    pub version: u32,
    /// The authentication token, empty until the handshake's `Login` step
    /// has completed.
    pub auth_token: String,
    /// The command payload.
    pub content_body: RconBody,
}

/// The on-the-wire shape of a request body, serialized as compact JSON.
#[derive(Serialize)]
struct WireRequestBody {
    #[serde(rename = "authToken")]
    auth_token: String,
    version: u32,
    name: String,
    #[serde(rename = "contentBody")]
    content_body: String,
}

impl RconRequest {
    /// Builds a new request. `request_id` must be assigned by the caller
    /// (the session), since uniqueness is a per-session property this type
    /// cannot enforce on its own.
    pub fn new(
        request_id: u32,
        name: impl Into<String>,
        version: u32,
        auth_token: impl Into<String>,
        content_body: impl Into<RconBody>,
    ) -> Self {
        Self {
            request_id,
            name: name.into(),
            version,
            auth_token: auth_token.into(),
            content_body: content_body.into(),
        }
    }

    /// Encodes this request's body into the compact JSON bytes that belong
    /// after the header, unmasked.
    ///
    /// The caller is responsible for XOR-masking the returned bytes (via
    /// [`crate::frame::xor_mask`]) before writing them to the wire.
    pub fn encode_body(&self) -> Vec<u8> {
        let wire = WireRequestBody {
            auth_token: self.auth_token.clone(),
            version: self.version,
            name: self.name.clone(),
            content_body: self.content_body.clone().into_content_body(),
        };
        serde_json::to_vec(&wire).expect("request body is always encodable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_structured_body_as_nested_json_string() {
        let req = RconRequest::new(
            0,
            "AddAdmin",
            2,
            "",
            serde_json::json!({"PlayerId": "123", "AdminGroup": "owner", "Comment": "x"}),
        );
        let body = req.encode_body();
        let outer: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let content_body = outer["contentBody"].as_str().unwrap();
        let inner: serde_json::Value = serde_json::from_str(content_body).unwrap();
        assert_eq!(inner["PlayerId"], "123");
    }

    #[test]
    fn empty_auth_token_until_handshake_completes() {
        let req = RconRequest::new(0, "ServerConnect", 2, "", "");
        let body = req.encode_body();
        let outer: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(outer["authToken"], "");
        assert_eq!(outer["contentBody"], "");
    }

    #[test]
    fn compact_separators_no_whitespace() {
        let req = RconRequest::new(0, "Login", 2, "tok", "pw");
        let body = req.encode_body();
        assert!(!body.contains(&b' '));
    }
}
