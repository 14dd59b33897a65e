//! Read-only channel listing.

use crate::channel::ChannelSummary;
use crate::registry::Registry;
use std::sync::Arc;

/// Lists live channels for introspection.
#[derive(Clone)]
pub struct ChannelEnumerator {
    registry: Arc<Registry>,
}

impl ChannelEnumerator {
    /// Create an enumerator over a registry.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Snapshot every channel, ordered by channel id.
    #[must_use]
    pub fn list(&self) -> Vec<ChannelSummary> {
        let mut channels = self.registry.snapshot();
        channels.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        channels
    }
}
