//! 时序曲线 handlers
//!
//! - GET /api/series
//!
//! 演示用的确定性曲线生成器：按 metric 选基准值、按 series 加相位偏移，
//! 历史真值查询走时序库自身的查询界面，不在本服务内。

use crate::AppState;
use crate::middleware::require_user;
use api_contract::{ApiResponse, SeriesMeta, SeriesQuery, SeriesResponse, SeriesRow};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

const LABELS: [&str; 5] = [
    "2026-01-20",
    "2026-01-21",
    "2026-01-22",
    "2026-01-23",
    "2026-01-24",
];

pub async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_user(&state, &headers) {
        return response;
    }

    let base = match query.metric.as_str() {
        "v" => 220.0,
        "a" => 5.0,
        "pf" => 0.92,
        "kw" => 3.0,
        "kwh" => 12.0,
        _ => 10.0,
    };
    let bump = match query.series.as_str() {
        "l1" => 0.3,
        "l2" => 0.6,
        "l3" => 0.9,
        _ => 0.0,
    };
    let step = if matches!(query.metric.as_str(), "kwh" | "kw") {
        0.5
    } else {
        0.2
    };

    let labels: Vec<String> = LABELS.iter().map(|label| label.to_string()).collect();
    let values: Vec<f64> = (0..labels.len())
        .map(|i| base + bump + i as f64 * step)
        .collect();
    let rows: Vec<SeriesRow> = labels
        .iter()
        .zip(values.iter())
        .map(|(t, v)| SeriesRow {
            t: t.clone(),
            v: *v,
        })
        .collect();

    let response = SeriesResponse {
        meta: SeriesMeta {
            device: query.device,
            metric: query.metric,
            series: query.series,
            from: query.date_from,
            to: query.date_to,
            group: query.group,
        },
        labels,
        values,
        rows,
    };
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}
