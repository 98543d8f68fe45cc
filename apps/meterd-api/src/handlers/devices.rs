//! 设备查询 handlers
//!
//! - GET /api/devices        全部缓存设备，按 last_seen 降序
//! - GET /api/device/latest  单设备最新状态，未知键返回 404
//!
//! 快照与通道列表在读取时从最近报文现算，不做缓存。

use crate::AppState;
use crate::middleware::require_user;
use crate::utils::response::{not_found_error, storage_error};
use api_contract::{ApiResponse, DeviceLatestResponse, DeviceListItem, DeviceListResponse};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::{DeviceRecord, RawPayload, make_key};
use meterd_normalize::{build_channels, normalize};
use meterd_storage::{age_seconds, is_online, now_epoch_ms};

#[derive(serde::Deserialize)]
pub struct DeviceLatestQuery {
    pub country: String,
    pub site_id: String,
    pub model: String,
    pub device_id: String,
}

pub async fn list_devices(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user(&state, &headers) {
        return response;
    }
    let entries = match state.cache.list_all().await {
        Ok(entries) => entries,
        Err(err) => return storage_error(err),
    };

    let now = now_epoch_ms();
    let mut items: Vec<DeviceListItem> = entries
        .into_iter()
        .map(|(key, record, payload)| list_item(key, record, payload, now, state.online_seconds))
        .collect();
    items.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    let count = items.len();

    (
        StatusCode::OK,
        Json(ApiResponse::success(DeviceListResponse { items, count })),
    )
        .into_response()
}

pub async fn device_latest(
    State(state): State<AppState>,
    Query(query): Query<DeviceLatestQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_user(&state, &headers) {
        return response;
    }
    let key = make_key(&query.country, &query.site_id, &query.model, &query.device_id);
    let (record, payload) = match state.cache.get(&key).await {
        Ok(Some(pair)) => pair,
        Ok(None) => return not_found_error("device not found"),
        Err(err) => return storage_error(err),
    };

    let now = now_epoch_ms();
    let summary = normalize(&payload);
    let channels = build_channels(&payload);
    let response = DeviceLatestResponse {
        key,
        online: is_online(record.last_seen, now, state.online_seconds),
        age_sec: round1(age_seconds(record.last_seen, now)),
        last_seen: record.last_seen,
        last_topic: record.last_topic,
        payload,
        channel_count: channels.len(),
        channels,
        summary_value: summary.clone(),
        summary,
    };
    (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
}

/// 组装设备列表单项。
fn list_item(
    key: String,
    record: DeviceRecord,
    payload: RawPayload,
    now: i64,
    online_seconds: u64,
) -> DeviceListItem {
    let summary = normalize(&payload);
    let channels = build_channels(&payload);
    let device_short = if record.device_id.is_empty() {
        key.rsplit('/').next().unwrap_or(&key).to_string()
    } else {
        record.device_id.clone()
    };
    let device_display = if record.device_id.is_empty() {
        key.clone()
    } else {
        record.device_id.clone()
    };
    DeviceListItem {
        age_sec: round1(age_seconds(record.last_seen, now)),
        online: is_online(record.last_seen, now, online_seconds),
        kw: summary.kw,
        pf: summary.pf_avg,
        channel_count: channels.len(),
        device_topic: key,
        device_short,
        device_display,
        country: record.country,
        site_id: record.site_id,
        model: record.model,
        device_id: record.device_id,
        last_seen: record.last_seen,
        last_type: record.last_type,
        last_topic: record.last_topic,
        last_payload: payload,
        summary_value: summary,
        channels,
    }
}

/// 秒龄保留 1 位小数。
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
