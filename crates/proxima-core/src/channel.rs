//! Channel abstraction for Proxima.
//!
//! A channel is a named set of subscriber handles. Channels live only while
//! they have subscribers; the registry reclaims them once empty.

use crate::subscriber::{SubscriberHandle, SubscriberId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Maximum channel id length in bytes.
pub const MAX_CHANNEL_ID_LENGTH: usize = 256;

/// A channel identifier.
pub type ChannelId = String;

/// Validate a channel id.
///
/// # Errors
///
/// Returns an error message if the channel id is empty or too long.
pub fn validate_channel_id(id: &str) -> Result<(), &'static str> {
    if id.trim().is_empty() {
        return Err("channelId is required");
    }
    if id.len() > MAX_CHANNEL_ID_LENGTH {
        return Err("channelId is too long");
    }
    Ok(())
}

/// Point-in-time view of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    /// Channel identifier.
    pub channel_id: ChannelId,
    /// Number of attached subscribers.
    pub subscriber_count: usize,
}

/// A channel and its attached subscribers.
#[derive(Debug)]
pub struct Channel {
    /// Channel identifier.
    id: ChannelId,
    /// Attached subscribers by id.
    subscribers: HashMap<SubscriberId, SubscriberHandle>,
}

impl Channel {
    /// Create an empty channel.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            subscribers: HashMap::new(),
        }
    }

    /// Get the channel id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if the channel has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Check if a subscriber is attached.
    #[must_use]
    pub fn contains(&self, subscriber: SubscriberId) -> bool {
        self.subscribers.contains_key(&subscriber)
    }

    /// Attach a subscriber.
    pub fn attach(&mut self, handle: SubscriberHandle) {
        debug!(channel = %self.id, subscriber = handle.id(), "Subscriber attached");
        self.subscribers.insert(handle.id(), handle);
    }

    /// Detach a subscriber, returning its handle if it was attached.
    pub fn detach(&mut self, subscriber: SubscriberId) -> Option<SubscriberHandle> {
        let handle = self.subscribers.remove(&subscriber);
        if handle.is_some() {
            debug!(channel = %self.id, subscriber, "Subscriber detached");
        }
        handle
    }

    /// Clone every subscriber handle.
    ///
    /// Fan-out iterates this copy so that detaches during delivery never
    /// touch the live set being read.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SubscriberHandle> {
        self.subscribers.values().cloned().collect()
    }

    /// Summarize the channel.
    #[must_use]
    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            channel_id: self.id.clone(),
            subscriber_count: self.subscribers.len(),
        }
    }
}
