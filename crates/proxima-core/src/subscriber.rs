//! Subscriber connections.
//!
//! A subscriber is split in two halves:
//!
//! - [`SubscriberHandle`] is the push side. The registry stores one per
//!   attached subscriber and the dispatcher clones it for fan-out.
//! - [`Subscription`] is the receive side, owned by the transport. It yields
//!   encoded frames as a [`Stream`] and detaches itself from the registry
//!   when dropped, whichever way the connection ended.

use crate::channel::ChannelId;
use crate::registry::Registry;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// A unique subscriber identifier.
pub type SubscriberId = u64;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique subscriber id.
#[must_use]
pub fn next_subscriber_id() -> SubscriberId {
    NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reasons a push can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    /// The subscriber's queue is full.
    #[error("Subscriber queue full")]
    Full,

    /// The receive side is gone.
    #[error("Subscriber closed")]
    Closed,
}

/// Push side of a subscriber connection.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: SubscriberId,
    sender: mpsc::Sender<Bytes>,
}

impl SubscriberHandle {
    /// Wrap the sending half of a subscriber queue.
    #[must_use]
    pub fn new(id: SubscriberId, sender: mpsc::Sender<Bytes>) -> Self {
        Self { id, sender }
    }

    /// Get the subscriber id.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Queue a frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`PushError`] if the queue is full or the subscriber is gone.
    pub fn push(&self, frame: Bytes) -> Result<(), PushError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }

    /// Check whether the receive side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Lifecycle of a subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Being added to its channel.
    Attaching,
    /// Attached and receiving frames.
    Open,
    /// Removed from its channel. Terminal.
    Detached,
}

/// Receive side of a subscriber connection.
pub struct Subscription {
    id: SubscriberId,
    channel_id: ChannelId,
    receiver: mpsc::Receiver<Bytes>,
    registry: Arc<Registry>,
    state: SubscriberState,
    keep_alive: Option<KeepAlive>,
}

struct KeepAlive {
    interval: Interval,
    frame: Bytes,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        channel_id: impl Into<ChannelId>,
        receiver: mpsc::Receiver<Bytes>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            id,
            channel_id: channel_id.into(),
            receiver,
            registry,
            state: SubscriberState::Attaching,
            keep_alive: None,
        }
    }

    /// Emit `frame` whenever the stream has been idle for `period`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn set_keep_alive(&mut self, period: Duration, frame: Bytes) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.keep_alive = Some(KeepAlive { interval, frame });
    }

    pub(crate) fn mark_open(&mut self) {
        self.state = SubscriberState::Open;
    }

    /// Get the subscriber id.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Get the channel this subscription is attached to.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Get the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Take the next queued frame without waiting.
    ///
    /// Keep-alive frames are never returned here.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.detach();
                None
            }
        }
    }

    /// Detach from the registry now. Idempotent.
    pub fn detach(&mut self) {
        if self.state == SubscriberState::Detached {
            return;
        }
        self.state = SubscriberState::Detached;
        self.registry.detach(&self.channel_id, self.id);
    }
}

impl Stream for Subscription {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let this = self.get_mut();

        if this.state == SubscriberState::Detached {
            return Poll::Ready(None);
        }

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(frame)) => {
                if let Some(keep_alive) = this.keep_alive.as_mut() {
                    keep_alive.interval.reset();
                }
                return Poll::Ready(Some(frame));
            }
            Poll::Ready(None) => {
                // Every sender is gone: evicted by the dispatcher or the
                // registry was shut down.
                trace!(channel = %this.channel_id, subscriber = this.id, "Subscriber queue closed");
                this.detach();
                return Poll::Ready(None);
            }
            Poll::Pending => {}
        }

        if let Some(keep_alive) = this.keep_alive.as_mut() {
            if keep_alive.interval.poll_tick(cx).is_ready() {
                return Poll::Ready(Some(keep_alive.frame.clone()));
            }
        }

        Poll::Pending
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel_id", &self.channel_id)
            .field("state", &self.state)
            .finish()
    }
}
