//! HTTP handlers for the Proxima server.
//!
//! This module wires the router, the shared state and the request handlers.
//! Position streams live in [`crate::stream`].

use crate::auth;
use crate::config::Config;
use crate::consent::{ConsentRecord, ConsentStatus, ConsentStore, NewConsent};
use crate::error::{ApiError, Result};
use crate::manifest;
use crate::metrics;
use crate::stream;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use proxima_core::{
    BroadcastEvent, ChannelEnumerator, ChannelSummary, Dispatcher, Registry, RegistryConfig,
};
use proxima_geo::{classify, find_nearby, format_distance, haversine_km, Candidate, DistanceClass, GeoPoint, NearbyMatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared server state.
pub struct AppState {
    /// The channel registry.
    pub registry: Arc<Registry>,
    /// Broadcast fan-out.
    pub dispatcher: Dispatcher,
    /// Channel listing.
    pub enumerator: ChannelEnumerator,
    /// Consent records.
    pub consents: ConsentStore,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let registry_config = RegistryConfig {
            subscriber_buffer: config.stream.buffer_size,
            keep_alive: config.stream.keep_alive(),
        };
        let registry = Arc::new(Registry::with_config(registry_config));

        Self {
            dispatcher: Dispatcher::new(Arc::clone(&registry)),
            enumerator: ChannelEnumerator::new(Arc::clone(&registry)),
            consents: ConsentStore::new(config.consent.default_ttl()),
            registry,
            config,
        }
    }
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    if config.auth.api_keys.is_empty() {
        warn!("No API keys configured, /api routes are unauthenticated");
    }

    let app = build_router(Arc::clone(&state));

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Proxima server listening on {}", addr);
    info!("Position streams: http://{}/api/proximity/stream/:channelId", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&state.registry)))
        .await?;

    info!("Proxima server stopped");
    Ok(())
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/proximity/distance", post(distance_handler))
        .route("/api/proximity/nearby", post(nearby_handler))
        .route("/api/proximity/broadcast", post(broadcast_handler))
        .route(
            "/api/proximity/stream/:channel_id",
            get(stream::stream_handler),
        )
        .route("/api/proximity/channels", get(channels_handler))
        .route("/api/consent", post(create_consent_handler))
        .route(
            "/api/consent/:consent_id",
            get(validate_consent_handler).delete(revoke_consent_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/manifest", get(manifest_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve on Ctrl-C or SIGTERM, closing every open stream first so the
/// graceful shutdown is not held up by long-lived responses.
async fn shutdown_signal(registry: Arc<Registry>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, closing position streams");
    registry.close_all();
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Manifest handler.
async fn manifest_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(manifest::manifest(!state.config.auth.api_keys.is_empty()))
}

// Broadcast

/// Body of `POST /api/proximity/broadcast`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub published: bool,
    pub channel_id: String,
    pub subscriber_count: usize,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn broadcast_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<Json<BroadcastResponse>> {
    let Json(request) = payload?;

    let (channel_id, profile_id, location) = match (
        present(request.channel_id),
        present(request.profile_id),
        request.location,
    ) {
        (Some(channel_id), Some(profile_id), Some(location)) => (channel_id, profile_id, location),
        _ => {
            return Err(ApiError::InvalidInput(
                "channelId, profileId and location are required".to_string(),
            ))
        }
    };

    let event = BroadcastEvent::new(profile_id, location, request.metadata);
    let start = Instant::now();
    let report = state.dispatcher.publish(&channel_id, event)?;
    metrics::record_publish(&report, start.elapsed().as_secs_f64());
    if report.evicted > 0 {
        metrics::set_active_channels(state.registry.channel_count());
    }

    debug!(
        channel = %channel_id,
        subscribers = report.subscriber_count,
        delivered = report.delivered,
        "Broadcast"
    );

    Ok(Json(BroadcastResponse {
        published: true,
        channel_id,
        subscriber_count: report.subscriber_count,
    }))
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelSummary>,
    pub total: usize,
}

async fn channels_handler(State(state): State<Arc<AppState>>) -> Json<ChannelsResponse> {
    let channels = state.enumerator.list();
    Json(ChannelsResponse {
        total: channels.len(),
        channels,
    })
}

// Distance and nearby

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub from: GeoPoint,
    pub to: GeoPoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResponse {
    pub distance_km: f64,
    pub distance_meters: f64,
    pub formatted: String,
    pub classification: DistanceClass,
}

async fn distance_handler(
    payload: std::result::Result<Json<DistanceRequest>, JsonRejection>,
) -> Result<Json<DistanceResponse>> {
    let Json(request) = payload?;
    request.from.validate()?;
    request.to.validate()?;

    let km = haversine_km(request.from, request.to);
    Ok(Json(DistanceResponse {
        distance_km: km,
        distance_meters: km * 1000.0,
        formatted: format_distance(km),
        classification: classify(km),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    pub origin: GeoPoint,
    pub radius_km: f64,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResult {
    #[serde(flatten)]
    pub entry: NearbyMatch,
    pub formatted: String,
    pub classification: DistanceClass,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub results: Vec<NearbyResult>,
    pub total: usize,
}

async fn nearby_handler(
    payload: std::result::Result<Json<NearbyRequest>, JsonRejection>,
) -> Result<Json<NearbyResponse>> {
    let Json(request) = payload?;

    let results: Vec<NearbyResult> = find_nearby(
        request.origin,
        request.candidates,
        request.radius_km,
        request.limit,
    )?
    .into_iter()
    .map(|entry| NearbyResult {
        formatted: format_distance(entry.distance_km),
        classification: classify(entry.distance_km),
        entry,
    })
    .collect();

    Ok(Json(NearbyResponse {
        total: results.len(),
        results,
    }))
}

// Consent

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentValidation {
    pub consent_id: Uuid,
    pub valid: bool,
    pub status: ConsentStatus,
    pub consent: ConsentRecord,
}

fn parse_consent_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidInput(format!("Invalid consent id: {raw}")))
}

async fn create_consent_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewConsent>, JsonRejection>,
) -> Result<(StatusCode, Json<ConsentRecord>)> {
    let Json(request) = payload?;
    let record = state.consents.create(request)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn validate_consent_handler(
    State(state): State<Arc<AppState>>,
    Path(consent_id): Path<String>,
) -> Result<Json<ConsentValidation>> {
    let id = parse_consent_id(&consent_id)?;
    let record = state
        .consents
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("consent {id}")))?;
    let status = record.status_at(Utc::now());

    Ok(Json(ConsentValidation {
        consent_id: id,
        valid: status.is_valid(),
        status,
        consent: record,
    }))
}

async fn revoke_consent_handler(
    State(state): State<Arc<AppState>>,
    Path(consent_id): Path<String>,
) -> Result<Json<ConsentRecord>> {
    let id = parse_consent_id(&consent_id)?;
    Ok(Json(state.consents.revoke(id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, MetricsConfig, StreamConfig};
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use proxima_protocol::{codec, Frame};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            stream: StreamConfig {
                keep_alive_ms: 0,
                ..StreamConfig::default()
            },
            metrics: MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            },
            ..Config::default()
        }
    }

    fn app_with(config: Config) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(config));
        (build_router(Arc::clone(&state)), state)
    }

    fn app() -> (Router, Arc<AppState>) {
        app_with(test_config())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open_stream(app: &Router, channel: &str) -> Body {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/proximity/stream/{channel}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.into_body()
    }

    async fn next_raw(body: &mut Body) -> Option<bytes::Bytes> {
        let frame = tokio::time::timeout(Duration::from_secs(1), body.frame())
            .await
            .expect("timed out waiting for frame")?
            .expect("body error");
        Some(frame.into_data().expect("data frame"))
    }

    async fn next_frame(body: &mut Body) -> Frame {
        let data = next_raw(body).await.expect("stream ended");
        codec::decode(&data).unwrap()
    }

    async fn assert_no_frame(body: &mut Body) {
        let pending = tokio::time::timeout(Duration::from_millis(50), body.frame()).await;
        assert!(pending.is_err(), "unexpected frame on stream");
    }

    fn position(channel: &str, profile: &str) -> Value {
        json!({
            "channelId": channel,
            "profileId": profile,
            "location": {"lat": 52.52, "lng": 13.405}
        })
    }

    #[tokio::test]
    async fn test_stream_then_broadcast() {
        let (app, _) = app();
        let mut stream = open_stream(&app, "c1").await;

        match next_frame(&mut stream).await {
            Frame::Connected(welcome) => {
                assert_eq!(welcome.channel_id, "c1");
                assert_eq!(welcome.subscriber_count, 1);
            }
            other => panic!("Expected Connected frame, got {:?}", other),
        }

        let (status, body) = send(&app, post_json("/api/proximity/broadcast", position("c1", "p1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"published": true, "channelId": "c1", "subscriberCount": 1}));

        let raw = next_raw(&mut stream).await.unwrap();
        let text = std::str::from_utf8(&raw).unwrap();
        assert!(text.starts_with("event: position\ndata: "));
        assert!(text.contains("\"p1\""));
        assert!(text.contains("52.52"));

        match codec::decode(&raw).unwrap() {
            Frame::Position(event) => {
                assert_eq!(event.profile_id, "p1");
                assert_eq!(event.location, GeoPoint::new(52.52, 13.405));
                assert!(event.metadata.is_none());
            }
            other => panic!("Expected Position frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_headers() {
        let (app, _) = app();
        let response = app.oneshot(get("/api/proximity/stream/c1")).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }

    #[tokio::test]
    async fn test_broadcast_to_ghost_channel() {
        let (app, _) = app();

        let (status, body) = send(&app, post_json("/api/proximity/broadcast", position("ghost", "p1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["published"], true);
        assert_eq!(body["subscriberCount"], 0);

        let (_, channels) = send(&app, get("/api/proximity/channels")).await;
        assert_eq!(channels, json!({"channels": [], "total": 0}));
    }

    #[tokio::test]
    async fn test_two_streams_identical_payload() {
        let (app, _) = app();
        let mut first = open_stream(&app, "c2").await;
        let mut second = open_stream(&app, "c2").await;

        assert!(matches!(next_frame(&mut first).await, Frame::Connected(w) if w.subscriber_count == 1));
        assert!(matches!(next_frame(&mut second).await, Frame::Connected(w) if w.subscriber_count == 2));

        let (_, body) = send(&app, post_json("/api/proximity/broadcast", position("c2", "p9"))).await;
        assert_eq!(body["subscriberCount"], 2);

        let a = next_raw(&mut first).await.unwrap();
        let b = next_raw(&mut second).await.unwrap();
        assert_eq!(a, b);

        assert_no_frame(&mut first).await;
        assert_no_frame(&mut second).await;
    }

    #[tokio::test]
    async fn test_broadcast_oversized_event_is_bad_request() {
        let (app, _) = app();
        let mut request = position("big", "p1");
        request["metadata"] = json!({ "blob": "x".repeat(1_100_000) });

        let (status, body) = send(&app, post_json("/api/proximity/broadcast", request.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let mut stream = open_stream(&app, "big").await;
        next_frame(&mut stream).await;

        let (status, _) = send(&app, post_json("/api/proximity/broadcast", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_no_frame(&mut stream).await;
    }

    #[tokio::test]
    async fn test_broadcast_metadata_passthrough() {
        let (app, _) = app();
        let mut stream = open_stream(&app, "meta").await;
        next_frame(&mut stream).await;

        let mut request = position("meta", "p1");
        request["metadata"] = json!({"speed": 3, "tags": ["x"]});
        send(&app, post_json("/api/proximity/broadcast", request)).await;

        match next_frame(&mut stream).await {
            Frame::Position(event) => {
                assert_eq!(event.metadata, Some(json!({"speed": 3, "tags": ["x"]})))
            }
            other => panic!("Expected Position frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_broadcast_missing_fields() {
        let (app, state) = app();
        let _stream = open_stream(&app, "c1").await;

        let cases = [
            json!({"profileId": "p1", "location": {"lat": 1.0, "lng": 2.0}}),
            json!({"channelId": "c1", "location": {"lat": 1.0, "lng": 2.0}}),
            json!({"channelId": "c1", "profileId": "p1"}),
            json!({"channelId": "", "profileId": "p1", "location": {"lat": 1.0, "lng": 2.0}}),
            json!({"channelId": "c1", "profileId": "p1", "location": {"lat": "north"}}),
        ];

        for case in cases {
            let (status, body) = send(&app, post_json("/api/proximity/broadcast", case.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}");
            assert!(body["error"].is_string());
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/proximity/broadcast")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.registry.subscriber_count("c1"), 1);
    }

    #[tokio::test]
    async fn test_stream_cancel_reclaims_channel() {
        let (app, _) = app();
        let mut stream = open_stream(&app, "c3").await;
        next_frame(&mut stream).await;

        let (_, listing) = send(&app, get("/api/proximity/channels")).await;
        assert_eq!(
            listing,
            json!({"channels": [{"channelId": "c3", "subscriberCount": 1}], "total": 1})
        );

        drop(stream);

        let (_, listing) = send(&app, get("/api/proximity/channels")).await;
        assert_eq!(listing["total"], 0);

        let (_, body) = send(&app, post_json("/api/proximity/broadcast", position("c3", "p1"))).await;
        assert_eq!(body["subscriberCount"], 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_streams() {
        let (app, state) = app();
        let mut stream = open_stream(&app, "c4").await;
        next_frame(&mut stream).await;

        state.registry.close_all();
        assert!(next_raw(&mut stream).await.is_none());

        let (status, _) = send(&app, get("/api/proximity/stream/c4")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_key_gate() {
        let (app, _) = app_with(Config {
            auth: AuthConfig {
                api_keys: vec!["secret".to_string()],
            },
            ..test_config()
        });

        let (status, body) = send(&app, get("/api/proximity/channels")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .uri("/api/proximity/channels")
            .header(auth::API_KEY_HEADER, "wrong")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.0, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/api/proximity/channels")
            .header(auth::API_KEY_HEADER, "secret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.0, StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get("/api/proximity/stream/c1?apiKey=secret"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Public routes stay open
        let (status, manifest) = send(&app, get("/api/manifest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(manifest["auth"]["enabled"], true);
        assert_eq!(send(&app, get("/health")).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_distance_endpoint() {
        let (app, _) = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/proximity/distance",
                json!({"from": {"lat": 52.52, "lng": 13.405}, "to": {"lat": 52.5201, "lng": 13.4051}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["classification"], "immediate");
        assert!(body["formatted"].as_str().unwrap().ends_with(" m"));
        assert!(body["distanceKm"].as_f64().unwrap() < 0.05);

        let (status, _) = send(
            &app,
            post_json(
                "/api/proximity/distance",
                json!({"from": {"lat": 95.0, "lng": 0.0}, "to": {"lat": 0.0, "lng": 0.0}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nearby_endpoint() {
        let (app, _) = app();

        let (status, body) = send(
            &app,
            post_json(
                "/api/proximity/nearby",
                json!({
                    "origin": {"lat": 52.52, "lng": 13.405},
                    "radiusKm": 5.0,
                    "candidates": [
                        {"profileId": "paris", "location": {"lat": 48.8566, "lng": 2.3522}},
                        {"profileId": "mid", "location": {"lat": 52.53, "lng": 13.42}},
                        {"profileId": "near", "location": {"lat": 52.5201, "lng": 13.4051}}
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["results"][0]["profileId"], "near");
        assert_eq!(body["results"][1]["profileId"], "mid");
        assert!(body["results"][1]["distanceKm"].is_number());
        assert!(body["results"][1]["classification"].is_string());
    }

    #[tokio::test]
    async fn test_consent_lifecycle() {
        let (app, _) = app();

        let (status, record) = send(
            &app,
            post_json("/api/consent", json!({"profileId": "p1", "granteeId": "p2"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["scope"], "location");
        let id = record["consentId"].as_str().unwrap().to_string();

        let (status, check) = send(&app, get(&format!("/api/consent/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(check["valid"], true);
        assert_eq!(check["status"], "valid");
        assert!(check["consent"].get("revokedAt").is_none());

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/consent/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let (status, revoked) = send(&app, delete(&id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(revoked["revokedAt"].is_string());

        let (_, check) = send(&app, get(&format!("/api/consent/{id}"))).await;
        assert_eq!(check["valid"], false);
        assert_eq!(check["status"], "revoked");
        assert_eq!(check["consent"]["revokedAt"], revoked["revokedAt"]);

        assert_eq!(send(&app, delete(&id)).await.0, StatusCode::CONFLICT);

        let unknown = Uuid::new_v4();
        assert_eq!(
            send(&app, get(&format!("/api/consent/{unknown}"))).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(&app, get("/api/consent/not-a-uuid")).await.0,
            StatusCode::BAD_REQUEST
        );

        let (status, _) = send(&app, post_json("/api/consent", json!({"profileId": "p1"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
