//! Metrics collection and export for Proxima.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use proxima_core::PublishReport;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const STREAMS_TOTAL: &str = "proxima_streams_total";
    pub const STREAMS_ACTIVE: &str = "proxima_streams_active";
    pub const EVENTS_PUBLISHED: &str = "proxima_events_published_total";
    pub const FRAMES_TOTAL: &str = "proxima_frames_total";
    pub const FRAMES_BYTES: &str = "proxima_frames_bytes";
    pub const FRAMES_WRITTEN_BYTES: &str = "proxima_frames_written_bytes";
    pub const SUBSCRIBERS_EVICTED: &str = "proxima_subscribers_evicted_total";
    pub const CHANNELS_ACTIVE: &str = "proxima_channels_active";
    pub const PUBLISH_LATENCY_SECONDS: &str = "proxima_publish_latency_seconds";
    pub const ERRORS_TOTAL: &str = "proxima_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::STREAMS_TOTAL,
        "Total number of position streams opened since server start"
    );
    metrics::describe_gauge!(names::STREAMS_ACTIVE, "Current number of open position streams");
    metrics::describe_counter!(names::EVENTS_PUBLISHED, "Total number of broadcast events published");
    metrics::describe_counter!(names::FRAMES_TOTAL, "Total number of frames queued to subscribers");
    metrics::describe_counter!(names::FRAMES_BYTES, "Total bytes of frames queued to subscribers");
    metrics::describe_counter!(
        names::FRAMES_WRITTEN_BYTES,
        "Total bytes of frames written to stream bodies"
    );
    metrics::describe_counter!(
        names::SUBSCRIBERS_EVICTED,
        "Subscribers dropped because their queue rejected a frame"
    );
    metrics::describe_gauge!(names::CHANNELS_ACTIVE, "Current number of active channels");
    metrics::describe_histogram!(
        names::PUBLISH_LATENCY_SECONDS,
        "Time to fan one event out to a channel"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of request errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new stream.
pub fn record_stream_opened() {
    counter!(names::STREAMS_TOTAL).increment(1);
    gauge!(names::STREAMS_ACTIVE).increment(1.0);
}

/// Record a stream ending.
pub fn record_stream_closed() {
    gauge!(names::STREAMS_ACTIVE).decrement(1.0);
}

/// Record the outcome of a publish.
pub fn record_publish(report: &PublishReport, seconds: f64) {
    counter!(names::EVENTS_PUBLISHED).increment(1);
    counter!(names::FRAMES_TOTAL, "kind" => "position").increment(report.delivered as u64);
    counter!(names::FRAMES_BYTES).increment((report.delivered * report.frame_bytes) as u64);
    if report.evicted > 0 {
        counter!(names::SUBSCRIBERS_EVICTED).increment(report.evicted as u64);
    }
    histogram!(names::PUBLISH_LATENCY_SECONDS).record(seconds);
}

/// Record a frame written to a stream body.
pub fn record_frame_written(bytes: usize) {
    counter!(names::FRAMES_WRITTEN_BYTES).increment(bytes as u64);
}

/// Update active channel count.
pub fn set_active_channels(count: usize) {
    gauge!(names::CHANNELS_ACTIVE).set(count as f64);
}

/// Record an error.
pub fn record_error(error_type: &str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type.to_string()).increment(1);
}

/// Metrics guard that records the stream closing on drop.
pub struct StreamMetricsGuard;

impl StreamMetricsGuard {
    /// Create a new metrics guard, recording a stream.
    #[must_use]
    pub fn new() -> Self {
        record_stream_opened();
        Self
    }
}

impl Default for StreamMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamMetricsGuard {
    fn drop(&mut self) {
        record_stream_closed();
    }
}
