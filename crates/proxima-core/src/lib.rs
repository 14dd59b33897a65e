//! # proxima-core
//!
//! Ephemeral pub/sub broadcast layer for the Proxima proximity service.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Channel** - Named set of subscriber handles
//! - **Registry** - Channel map with lazy creation and empty-channel reclaim
//! - **Subscription** - One open stream, detached on drop
//! - **Dispatcher** - Encodes an event once and fans it out
//! - **Enumerator** - Read-only channel listing
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  subscribe  ┌─────────────┐  lookup  ┌──────────────┐
//! │ Subscription │────────────▶│  Registry   │◀─────────│  Dispatcher  │
//! └──────────────┘◀── frames ──└─────────────┘          └──────────────┘
//!                                     ▲
//!                                     │ snapshot
//!                              ┌─────────────┐
//!                              │ Enumerator  │
//!                              └─────────────┘
//! ```

pub mod channel;
pub mod dispatcher;
pub mod enumerator;
pub mod registry;
pub mod subscriber;

pub use channel::{Channel, ChannelId, ChannelSummary};
pub use dispatcher::{Dispatcher, PublishError, PublishReport};
pub use enumerator::ChannelEnumerator;
pub use registry::{Registry, RegistryConfig, RegistryError, RegistryStats};
pub use subscriber::{PushError, SubscriberHandle, SubscriberId, SubscriberState, Subscription};

pub use proxima_protocol::{BroadcastEvent, Frame, Welcome};
