//! Broadcast dispatcher.
//!
//! Publishing never creates a channel. The event is encoded once, before the
//! channel is looked up, so an unencodable event is rejected whether or not
//! anyone is listening. The same buffer is queued on every subscriber in the
//! channel snapshot; any subscriber whose queue rejects the frame is detached
//! on the spot.

use crate::channel::validate_channel_id;
use crate::registry::Registry;
use proxima_protocol::codec::MAX_FRAME_SIZE;
use proxima_protocol::{codec, BroadcastEvent, Frame, ProtocolError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Publish errors. None of them mutate registry state.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Invalid channel id.
    #[error("Invalid channel: {0}")]
    InvalidChannel(&'static str),

    /// Publisher identifier is empty.
    #[error("profileId is required")]
    MissingPublisher,

    /// Location is not a pair of finite numbers.
    #[error("location must contain numeric lat and lng")]
    InvalidLocation,

    /// Encoded event exceeds the frame size limit.
    #[error("Event of {0} bytes exceeds the maximum of {MAX_FRAME_SIZE} bytes")]
    EventTooLarge(usize),

    /// Event could not be encoded.
    #[error("Failed to encode event: {0}")]
    Encode(ProtocolError),
}

impl From<ProtocolError> for PublishError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::FrameTooLarge(size) => PublishError::EventTooLarge(size),
            other => PublishError::Encode(other),
        }
    }
}

impl PublishError {
    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, PublishError::Encode(_))
    }
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers in the channel when the event was published.
    pub subscriber_count: usize,
    /// Subscribers whose queue accepted the frame.
    pub delivered: usize,
    /// Subscribers detached because their queue rejected the frame.
    pub evicted: usize,
    /// Size of the encoded frame in bytes.
    pub frame_bytes: usize,
}

/// Fans published events out to channel subscribers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Publish an event to a channel.
    ///
    /// Returns the subscriber count observed before any evictions caused by
    /// this publish. Publishing to a channel nobody listens on reports zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel id, publisher or location is missing,
    /// or the encoded event is larger than a frame may be.
    pub fn publish(
        &self,
        channel_id: &str,
        event: BroadcastEvent,
    ) -> Result<PublishReport, PublishError> {
        validate_channel_id(channel_id).map_err(PublishError::InvalidChannel)?;
        if event.profile_id.trim().is_empty() {
            return Err(PublishError::MissingPublisher);
        }
        if !event.location.is_finite() {
            return Err(PublishError::InvalidLocation);
        }

        let frame = codec::encode(&Frame::Position(event))?;

        let Some(subscribers) = self.registry.lookup(channel_id) else {
            trace!(channel = %channel_id, "Publish to channel without subscribers");
            return Ok(PublishReport::default());
        };

        let mut report = PublishReport {
            subscriber_count: subscribers.len(),
            frame_bytes: frame.len(),
            ..Default::default()
        };

        for subscriber in &subscribers {
            match subscriber.push(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(
                        channel = %channel_id,
                        subscriber = subscriber.id(),
                        reason = %e,
                        "Evicting subscriber"
                    );
                    if self.registry.detach(channel_id, subscriber.id()) {
                        report.evicted += 1;
                    }
                }
            }
        }

        trace!(
            channel = %channel_id,
            subscribers = report.subscriber_count,
            delivered = report.delivered,
            evicted = report.evicted,
            "Published event"
        );

        Ok(report)
    }
}
