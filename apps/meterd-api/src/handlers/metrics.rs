//! 采集指标快照 handler
//!
//! - GET /api/metrics

use crate::AppState;
use crate::middleware::require_user;
use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use meterd_telemetry::metrics;

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user(&state, &headers) {
        return response;
    }

    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            raw_events: snapshot.raw_events,
            dropped_topic: snapshot.dropped_topic,
            payload_fallback: snapshot.payload_fallback,
            cache_upserts: snapshot.cache_upserts,
            sink_write_success: snapshot.sink_write_success,
            sink_write_failure: snapshot.sink_write_failure,
            broadcast_enqueued: snapshot.broadcast_enqueued,
            broadcast_dropped: snapshot.broadcast_dropped,
            sessions_opened: snapshot.sessions_opened,
            sessions_closed: snapshot.sessions_closed,
        })),
    )
        .into_response()
}
