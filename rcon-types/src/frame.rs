//! The length-prefixed header, XOR masking, and the resumable frame parser.

use crate::{error::FrameError, request::RconRequest, response::RconResponse};

/// Size, in bytes, of the fixed header that precedes every frame's body.
pub const HEADER_LEN: usize = 8;

/// The default cap on a single frame's body length, matching the game
/// server's own practical limits. Can be overridden via
/// [`FrameReader::with_max_body_len`].
pub const DEFAULT_MAX_BODY_LEN: u32 = 16 * 1024 * 1024;

/// Packs a request into its header and (unmasked) body bytes.
///
/// The caller is responsible for XOR-masking the body (via [`xor_mask`])
/// before writing `header || masked_body` to the wire.
pub fn pack_request(request: &RconRequest) -> (Vec<u8>, Vec<u8>) {
    let body = request.encode_body();
    let header = encode_header(request.request_id, body.len() as u32);
    (header, body)
}

/// Encodes an 8-byte little-endian `(request_id, body_len)` header.
pub fn encode_header(request_id: u32, body_len: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(&request_id.to_le_bytes());
    header.extend_from_slice(&body_len.to_le_bytes());
    header
}

fn decode_header(bytes: &[u8]) -> (u32, u32) {
    let request_id = u32::from_le_bytes(bytes[0..4].try_into().expect("slice is 4 bytes"));
    let body_len = u32::from_le_bytes(bytes[4..8].try_into().expect("slice is 4 bytes"));
    (request_id, body_len)
}

/// XOR-masks `data` with a repeating `key`.
///
/// If `key` is `None` or empty, `data` is returned unchanged — this is the
/// state before the handshake has installed a key.
///
/// # Panics
///
/// Panics if the masked output's length ever differs from the input's,
/// which would indicate a bug in this function rather than a condition a
/// caller can recover from.
pub fn xor_mask(data: &[u8], key: Option<&[u8]>) -> Vec<u8> {
    let Some(key) = key.filter(|k| !k.is_empty()) else {
        return data.to_vec();
    };
    let masked: Vec<u8> = data
        .iter()
        .enumerate()
        .map(|(i, byte)| byte ^ key[i % key.len()])
        .collect();
    assert_eq!(
        masked.len(),
        data.len(),
        "XOR operation resulted in a different length"
    );
    masked
}

/// A resumable parser that accumulates inbound bytes and yields complete
/// `(request_id, response)` frames as they become available.
///
/// Bytes that do not yet form a complete frame are kept in an internal
/// buffer across calls to [`FrameReader::push`].
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
    max_body_len: Option<u32>,
}

impl FrameReader {
    /// Creates a reader with the default maximum body length
    /// ([`DEFAULT_MAX_BODY_LEN`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with a custom maximum body length.
    pub fn with_max_body_len(max_body_len: u32) -> Self {
        Self {
            buffer: Vec::new(),
            max_body_len: Some(max_body_len),
        }
    }

    fn max_body_len(&self) -> u32 {
        self.max_body_len.unwrap_or(DEFAULT_MAX_BODY_LEN)
    }

    /// Appends newly-received bytes to the internal buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns a reference to the bytes not yet consumed into a frame.
    ///
    /// Exposed primarily for tests asserting that a partial tail is
    /// preserved across calls.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Parses as many complete frames as are currently buffered,
    /// XOR-unmasking each body with `xor_key` (if present) before decoding
    /// it as JSON.
    ///
    /// Leaves any trailing partial frame in the internal buffer for the
    /// next call. A decode error or an oversized body is fatal: the
    /// session that owns this reader must be torn down, and this reader
    /// must not be used again (the buffer position is left right before
    /// the offending frame).
    pub fn parse_frames(
        &mut self,
        xor_key: Option<&[u8]>,
    ) -> Result<Vec<(u32, RconResponse)>, FrameError> {
        let mut out = Vec::new();
        loop {
            if self.buffer.len() < HEADER_LEN {
                break;
            }
            let (request_id, body_len) = decode_header(&self.buffer[..HEADER_LEN]);
            if body_len > self.max_body_len() {
                return Err(FrameError::BodyTooLarge {
                    len: body_len,
                    max: self.max_body_len(),
                });
            }
            let frame_len = HEADER_LEN + body_len as usize;
            if self.buffer.len() < frame_len {
                break;
            }

            let masked_body = &self.buffer[HEADER_LEN..frame_len];
            let body = xor_mask(masked_body, xor_key);
            let response = RconResponse::unpack(request_id, &body)?;
            out.push((request_id, response));

            self.buffer.drain(..frame_len);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(request_id: u32, body: &[u8], key: Option<&[u8]>) -> Vec<u8> {
        let mut frame = encode_header(request_id, body.len() as u32);
        frame.extend_from_slice(&xor_mask(body, key));
        frame
    }

    fn response_body(content: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "name": "Test",
            "version": 2,
            "statusCode": 200,
            "statusMessage": "",
            "contentBody": content,
        }))
        .unwrap()
    }

    #[test]
    fn round_trips_request_through_parser() {
        let request = RconRequest::new(7, "GetPlayers", 2, "tok", "");
        let (header, body) = pack_request(&request);
        assert_eq!(header.len(), HEADER_LEN);

        // Simulate the server decoding it exactly as a request parser would.
        let (id, len) = decode_header(&header);
        assert_eq!(id, 7);
        assert_eq!(len as usize, body.len());
    }

    #[test]
    fn short_buffer_yields_no_frames_and_is_preserved() {
        let mut reader = FrameReader::new();
        reader.push(&[1, 2, 3, 4, 5, 6, 7]);
        let frames = reader.parse_frames(None).unwrap();
        assert!(frames.is_empty());
        assert_eq!(reader.pending().len(), 7);
    }

    #[test]
    fn two_full_frames_plus_partial_tail() {
        let mut reader = FrameReader::new();
        let body = response_body("hello");
        let frame = make_frame(1, &body, None);

        let mut buf = frame.clone();
        buf.extend_from_slice(&frame);
        // partial third frame: header plus a few body bytes
        buf.extend_from_slice(&encode_header(2, 100));
        buf.extend_from_slice(&[0xAA; 5]);

        reader.push(&buf);
        let frames = reader.parse_frames(None).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(reader.pending().len(), HEADER_LEN + 5);
    }

    #[test]
    fn frame_boundary_split_across_two_pushes() {
        let mut reader = FrameReader::new();
        let body_a = response_body("a");
        let frame_a = make_frame(0, &body_a, None);
        let body_b = response_body("bbbbbbbbbb");
        let frame_b = make_frame(1, &body_b, None);

        let mut first_delivery = frame_a.clone();
        first_delivery.extend_from_slice(&frame_b[..6]);
        reader.push(&first_delivery);
        let frames = reader.parse_frames(None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, 0);

        reader.push(&frame_b[6..]);
        let frames = reader.parse_frames(None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, 1);
    }

    #[test]
    fn xor_with_single_byte_key_is_plain_xor() {
        let data = [0b1010_1010, 0b0000_1111];
        let masked = xor_mask(&data, Some(&[0xFF]));
        assert_eq!(masked, vec![!data[0], !data[1]]);
    }

    #[test]
    fn xor_without_key_is_identity() {
        let data = b"unmasked";
        assert_eq!(xor_mask(data, None), data.to_vec());
        assert_eq!(xor_mask(data, Some(&[])), data.to_vec());
    }

    #[test]
    fn oversized_body_is_fatal() {
        let mut reader = FrameReader::with_max_body_len(4);
        reader.push(&encode_header(0, 100));
        let err = reader.parse_frames(None).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { len: 100, max: 4 }));
    }
}
