//! Codec for encoding and decoding Proxima frames.
//!
//! Frames use the `text/event-stream` block format: an `event:` line, a
//! single `data:` line carrying compact JSON, and a blank line terminator.
//! Keep-alive frames are a lone comment line.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::frames::{Frame, EVENT_CONNECTED, EVENT_POSITION};

/// Maximum encoded frame size (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame terminator.
pub const FRAME_DELIMITER: &[u8] = b"\n\n";

const KEEP_ALIVE: &[u8] = b": keep-alive\n\n";

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON payload error.
    #[error("Payload error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame bytes are not UTF-8.
    #[error("Frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Event name not recognised.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Invalid frame data.
    #[error("Invalid frame: {0}")]
    Invalid(String),
}

/// Encode a frame to bytes.
///
/// The returned buffer is reference counted, so one encoding can be pushed to
/// any number of subscribers without copying.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized or is too large.
pub fn encode(frame: &Frame) -> Result<Bytes, ProtocolError> {
    let mut buf = BytesMut::new();
    encode_into(frame, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode a frame into an existing buffer.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized or is too large.
pub fn encode_into(frame: &Frame, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    let (name, payload) = match frame {
        Frame::Connected(welcome) => (EVENT_CONNECTED, serde_json::to_vec(welcome)?),
        Frame::Position(event) => (EVENT_POSITION, serde_json::to_vec(event)?),
        Frame::KeepAlive => {
            buf.extend_from_slice(KEEP_ALIVE);
            return Ok(());
        }
    };

    let size = "event: ".len() + name.len() + "\ndata: ".len() + payload.len() + 2;
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(size));
    }

    buf.reserve(size);
    buf.put_slice(b"event: ");
    buf.put_slice(name.as_bytes());
    buf.put_slice(b"\ndata: ");
    buf.put_slice(&payload);
    buf.put_slice(FRAME_DELIMITER);

    Ok(())
}

/// Decode a single frame.
///
/// The trailing blank line is optional. Multiple `data:` lines are joined
/// with newlines; a block holding only comments decodes as `KeepAlive`.
///
/// # Errors
///
/// Returns an error if the frame is malformed, too large, or names an
/// unknown event.
pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(data.len()));
    }

    let text = std::str::from_utf8(data)?;
    let mut event: Option<&str> = None;
    let mut payload: Option<String> = None;

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);

        match field {
            "event" => event = Some(value),
            "data" => match payload.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => payload = Some(value.to_string()),
            },
            // Other fields (id, retry) carry nothing we use.
            _ => {}
        }
    }

    match (event, payload) {
        (None, None) => Ok(Frame::KeepAlive),
        (Some(EVENT_CONNECTED), Some(json)) => Ok(Frame::Connected(serde_json::from_str(&json)?)),
        (Some(EVENT_POSITION), Some(json)) => Ok(Frame::Position(serde_json::from_str(&json)?)),
        (Some(name), Some(_)) => Err(ProtocolError::UnknownEvent(name.to_string())),
        (Some(name), None) => Err(ProtocolError::Invalid(format!(
            "event '{name}' has no data"
        ))),
        (None, Some(_)) => Err(ProtocolError::Invalid("data without event name".into())),
    }
}

/// Try to decode a frame from a buffer, advancing it if successful.
///
/// Returns `Ok(Some(frame))` if a complete frame was decoded,
/// `Ok(None)` if more data is needed, or `Err` on protocol error.
///
/// # Errors
///
/// Returns an error if the frame is too large or invalid.
pub fn decode_from(buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
    let Some(end) = buf
        .windows(FRAME_DELIMITER.len())
        .position(|w| w == FRAME_DELIMITER)
    else {
        if buf.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge(buf.len()));
        }
        return Ok(None);
    };

    let block = buf.split_to(end + FRAME_DELIMITER.len());
    decode(&block).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BroadcastEvent, Welcome};
    use proxima_geo::GeoPoint;
    use serde_json::json;

    #[test]
    fn test_encode_wire_format() {
        let event = BroadcastEvent::new("p1", GeoPoint::new(52.52, 13.405), None);
        let encoded = encode(&Frame::Position(event)).unwrap();
        let text = std::str::from_utf8(&encoded).unwrap();

        assert!(text.starts_with("event: position\ndata: {"));
        assert!(text.ends_with("}\n\n"));
        assert_eq!(text.matches('\n').count(), 3);
        assert!(text.contains("\"profileId\":\"p1\""));
        assert!(text.contains("52.52"));
    }

    #[test]
    fn test_keep_alive_is_comment() {
        let encoded = encode(&Frame::KeepAlive).unwrap();
        assert_eq!(&encoded[..], b": keep-alive\n\n");
        assert_eq!(decode(&encoded).unwrap(), Frame::KeepAlive);
    }

    #[test]
    fn test_decode_welcome() {
        let welcome = Welcome::new("c1", 2);
        let encoded = encode(&Frame::Connected(welcome.clone())).unwrap();

        match decode(&encoded).unwrap() {
            Frame::Connected(decoded) => assert_eq!(decoded, welcome),
            other => panic!("Expected Connected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_joins_data_lines() {
        let raw = b"event: position\ndata: {\"profileId\":\"p1\",\ndata: \"location\":{\"lat\":1.0,\"lng\":2.0},\"timestamp\":\"2024-01-01T00:00:00Z\"}\n\n";
        match decode(raw).unwrap() {
            Frame::Position(event) => {
                assert_eq!(event.profile_id, "p1");
                assert_eq!(event.location, GeoPoint::new(1.0, 2.0));
            }
            other => panic!("Expected Position frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_event() {
        match decode(b"event: presence\ndata: {}\n\n") {
            Err(ProtocolError::UnknownEvent(name)) => assert_eq!(name, "presence"),
            other => panic!("Expected UnknownEvent error, got {:?}", other),
        }
    }

    #[test]
    fn test_frame_too_large() {
        let metadata = json!({ "blob": "x".repeat(MAX_FRAME_SIZE) });
        let event = BroadcastEvent::new("p1", GeoPoint::new(0.0, 0.0), Some(metadata));

        match encode(&Frame::Position(event)) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("Expected FrameTooLarge error, got {:?}", other),
        }
    }

    #[test]
    fn test_streaming_decode() {
        let mut buf = BytesMut::new();
        encode_into(&Frame::connected("c1", 1), &mut buf).unwrap();
        encode_into(&Frame::KeepAlive, &mut buf).unwrap();

        // Half of a third frame stays buffered.
        let event = BroadcastEvent::new("p1", GeoPoint::new(0.0, 0.0), None);
        let third = encode(&Frame::Position(event)).unwrap();
        buf.extend_from_slice(&third[..10]);

        assert!(matches!(
            decode_from(&mut buf).unwrap(),
            Some(Frame::Connected(_))
        ));
        assert_eq!(decode_from(&mut buf).unwrap(), Some(Frame::KeepAlive));
        assert_eq!(decode_from(&mut buf).unwrap(), None);

        buf.extend_from_slice(&third[10..]);
        assert!(matches!(
            decode_from(&mut buf).unwrap(),
            Some(Frame::Position(_))
        ));
        assert!(buf.is_empty());
    }
}
