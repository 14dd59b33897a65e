//! Channel registry for Proxima.
//!
//! The registry owns the mapping from channel id to attached subscribers.
//! Channels are created on first subscribe and removed as soon as their last
//! subscriber detaches. Every mutation of a channel happens under that
//! entry's shard lock, and removal re-checks emptiness under the same lock,
//! so a concurrent attach can never be lost to a reclaim.

use crate::channel::{validate_channel_id, Channel, ChannelId, ChannelSummary};
use crate::subscriber::{next_subscriber_id, PushError, SubscriberHandle, SubscriberId, Subscription};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use proxima_protocol::{codec, Frame, ProtocolError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Invalid channel id.
    #[error("Invalid channel: {0}")]
    InvalidChannel(&'static str),

    /// The registry has been shut down.
    #[error("Registry is shut down")]
    Closed,

    /// Welcome frame could not be encoded.
    #[error("Failed to encode welcome frame: {0}")]
    Encode(#[from] ProtocolError),

    /// Welcome frame could not be queued.
    #[error("Failed to queue welcome frame: {0}")]
    Push(#[from] PushError),
}

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Frames buffered per subscriber before it counts as dead.
    pub subscriber_buffer: usize,
    /// Idle period after which a keep-alive frame is emitted.
    pub keep_alive: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 256,
            keep_alive: None,
        }
    }
}

/// The channel registry.
pub struct Registry {
    /// Channels indexed by id.
    channels: DashMap<ChannelId, Channel>,
    /// Configuration.
    config: RegistryConfig,
    /// Set once by [`Registry::close_all`].
    closed: AtomicBool,
}

impl Registry {
    /// Create a new registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        info!("Creating channel registry with config: {:?}", config);
        Self {
            channels: DashMap::new(),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the channel for `channel_id`, creating it if absent.
    ///
    /// The returned guard holds the entry's write lock.
    pub(crate) fn get_or_create(&self, channel_id: &str) -> RefMut<'_, ChannelId, Channel> {
        self.channels
            .entry(channel_id.to_string())
            .or_insert_with(|| {
                debug!(channel = %channel_id, "Creating new channel");
                Channel::new(channel_id)
            })
    }

    /// Remove a channel if it exists and has no subscribers.
    ///
    /// Returns `true` if the channel was removed.
    pub fn remove(&self, channel_id: &str) -> bool {
        let removed = self
            .channels
            .remove_if(channel_id, |_, channel| channel.is_empty())
            .is_some();
        if removed {
            debug!(channel = %channel_id, "Deleted empty channel");
        }
        removed
    }

    /// Snapshot the subscribers of a channel without creating it.
    #[must_use]
    pub fn lookup(&self, channel_id: &str) -> Option<Vec<SubscriberHandle>> {
        self.channels.get(channel_id).map(|entry| entry.snapshot())
    }

    /// Point-in-time listing of every channel.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChannelSummary> {
        self.channels.iter().map(|entry| entry.summary()).collect()
    }

    /// Attach a new subscriber to a channel.
    ///
    /// The channel is created on demand. The welcome frame is queued before
    /// the channel lock is released, so it always precedes any fan-out frame
    /// and its count includes the new subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel id is invalid or the registry is shut
    /// down.
    pub fn subscribe(self: &Arc<Self>, channel_id: &str) -> Result<Subscription, RegistryError> {
        validate_channel_id(channel_id).map_err(RegistryError::InvalidChannel)?;
        if self.is_closed() {
            return Err(RegistryError::Closed);
        }

        let id = next_subscriber_id();
        let (sender, receiver) = mpsc::channel(self.config.subscriber_buffer.max(1));
        let handle = SubscriberHandle::new(id, sender);

        // Dropping `subscription` on any early return below detaches it.
        let mut subscription = Subscription::new(id, channel_id, receiver, Arc::clone(self));

        let subscriber_count = {
            let mut channel = self.get_or_create(channel_id);
            channel.attach(handle.clone());
            let count = channel.subscriber_count();

            let welcome = codec::encode(&Frame::connected(channel_id, count))?;
            handle.push(welcome)?;
            count
        };

        // close_all may have cleared the map between the check and the attach.
        if self.is_closed() {
            return Err(RegistryError::Closed);
        }

        if let Some(period) = self.config.keep_alive {
            subscription.set_keep_alive(period, codec::encode(&Frame::KeepAlive)?);
        }
        subscription.mark_open();

        debug!(
            channel = %channel_id,
            subscriber = id,
            subscribers = subscriber_count,
            "Subscribed"
        );

        Ok(subscription)
    }

    /// Detach one subscriber, reclaiming its channel if it became empty.
    ///
    /// Returns `true` only for the call that actually removed the subscriber.
    pub fn detach(&self, channel_id: &str, subscriber: SubscriberId) -> bool {
        let detached = match self.channels.get_mut(channel_id) {
            Some(mut channel) => channel.detach(subscriber).is_some(),
            None => false,
        };

        if detached {
            self.remove(channel_id);
        }

        detached
    }

    /// Check if a channel exists.
    #[must_use]
    pub fn channel_exists(&self, channel_id: &str) -> bool {
        self.channels.contains_key(channel_id)
    }

    /// Get the subscriber count for a channel.
    #[must_use]
    pub fn subscriber_count(&self, channel_id: &str) -> usize {
        self.channels
            .get(channel_id)
            .map(|entry| entry.subscriber_count())
            .unwrap_or(0)
    }

    /// Get the number of live channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            channel_count: self.channels.len(),
            subscriber_count: self.channels.iter().map(|e| e.subscriber_count()).sum(),
        }
    }

    /// Check if the registry has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Shut the registry down.
    ///
    /// Drops every channel, which closes every subscriber queue and ends
    /// their streams. Later subscribes fail with [`RegistryError::Closed`].
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::Release);
        let stats = self.stats();
        self.channels.clear();
        info!(
            channels = stats.channel_count,
            subscribers = stats.subscriber_count,
            "Channel registry closed"
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of live channels.
    pub channel_count: usize,
    /// Subscribers across all channels.
    pub subscriber_count: usize,
}
