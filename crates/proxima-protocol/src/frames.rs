//! Frame types for Proxima position streams.

use chrono::{DateTime, Utc};
use proxima_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Event name of the welcome frame.
pub const EVENT_CONNECTED: &str = "connected";

/// Event name of a fan-out frame.
pub const EVENT_POSITION: &str = "position";

/// Payload of the welcome frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    /// Channel the subscriber attached to.
    pub channel_id: String,
    /// Subscribers on the channel, including the new one.
    pub subscriber_count: usize,
    /// When the frame was issued.
    pub timestamp: DateTime<Utc>,
}

impl Welcome {
    /// Create a welcome payload stamped with the current time.
    #[must_use]
    pub fn new(channel_id: impl Into<String>, subscriber_count: usize) -> Self {
        Self {
            channel_id: channel_id.into(),
            subscriber_count,
            timestamp: Utc::now(),
        }
    }
}

/// A published position update.
///
/// The timestamp is assigned when the event is constructed, i.e. at publish
/// time. `metadata` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEvent {
    /// Publisher profile identifier.
    pub profile_id: String,
    /// Published position.
    pub location: GeoPoint,
    /// Publish time.
    pub timestamp: DateTime<Utc>,
    /// Opaque caller-supplied metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl BroadcastEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(
        profile_id: impl Into<String>,
        location: GeoPoint,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            location,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// A frame pushed to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Welcome frame, always first on a stream.
    Connected(Welcome),
    /// Fan-out of a broadcast event.
    Position(BroadcastEvent),
    /// Idle keep-alive comment.
    KeepAlive,
}

impl Frame {
    /// Create a welcome frame.
    #[must_use]
    pub fn connected(channel_id: impl Into<String>, subscriber_count: usize) -> Self {
        Frame::Connected(Welcome::new(channel_id, subscriber_count))
    }

    /// Create a position frame.
    #[must_use]
    pub fn position(event: BroadcastEvent) -> Self {
        Frame::Position(event)
    }

    /// The `event:` name of the frame, `None` for comment frames.
    #[must_use]
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            Frame::Connected(_) => Some(EVENT_CONNECTED),
            Frame::Position(_) => Some(EVENT_POSITION),
            Frame::KeepAlive => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!(Frame::connected("c1", 1).event_name(), Some("connected"));
        let event = BroadcastEvent::new("p1", GeoPoint::new(1.0, 2.0), None);
        assert_eq!(Frame::position(event).event_name(), Some("position"));
        assert_eq!(Frame::KeepAlive.event_name(), None);
    }

    #[test]
    fn test_event_json_omits_missing_metadata() {
        let event = BroadcastEvent::new("p1", GeoPoint::new(52.52, 13.405), None);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["profileId"], "p1");
        assert_eq!(value["location"]["lat"], 52.52);
        assert!(value["timestamp"].is_string());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_event_metadata_passthrough() {
        let metadata = json!({"speed": 4.2, "tags": ["a", 1, null]});
        let event = BroadcastEvent::new("p1", GeoPoint::new(0.0, 0.0), Some(metadata.clone()));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["metadata"], metadata);
    }

    #[test]
    fn test_welcome_json_shape() {
        let value = serde_json::to_value(Welcome::new("c1", 3)).unwrap();
        assert_eq!(value["channelId"], "c1");
        assert_eq!(value["subscriberCount"], 3);
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
