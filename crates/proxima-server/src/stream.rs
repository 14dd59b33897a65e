//! Position stream endpoint.
//!
//! `GET /api/proximity/stream/:channelId` attaches a subscriber and returns
//! its frames as a `text/event-stream` body. When the client goes away hyper
//! drops the body, which drops the [`Subscription`] and detaches it.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use proxima_core::{Registry, Subscription};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

use crate::error::Result;
use crate::handlers::AppState;
use crate::metrics::{self, StreamMetricsGuard};

/// Open a position stream on a channel.
pub async fn stream_handler(
    Path(channel_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response> {
    let subscription = state.registry.subscribe(&channel_id)?;
    metrics::set_active_channels(state.registry.channel_count());

    debug!(
        channel = %channel_id,
        subscriber = subscription.id(),
        "Position stream opened"
    );

    Ok(event_stream(SubscriberBody::new(
        subscription,
        Arc::clone(&state.registry),
    )))
}

fn event_stream(body: SubscriberBody) -> Response {
    let mut response = (StatusCode::OK, Body::from_stream(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Response body wrapping a subscription.
struct SubscriberBody {
    subscription: Subscription,
    registry: Arc<Registry>,
    _metrics: StreamMetricsGuard,
}

impl SubscriberBody {
    fn new(subscription: Subscription, registry: Arc<Registry>) -> Self {
        Self {
            subscription,
            registry,
            _metrics: StreamMetricsGuard::new(),
        }
    }
}

impl Stream for SubscriberBody {
    type Item = std::result::Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.subscription.poll_next_unpin(cx).map(|frame| {
            frame.map(|bytes| {
                metrics::record_frame_written(bytes.len());
                Ok(bytes)
            })
        })
    }
}

impl Drop for SubscriberBody {
    fn drop(&mut self) {
        self.subscription.detach();
        metrics::set_active_channels(self.registry.channel_count());
        debug!(
            channel = %self.subscription.channel_id(),
            subscriber = self.subscription.id(),
            "Position stream closed"
        );
    }
}
