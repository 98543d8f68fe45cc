//! 稳定的 DTO 与 API 响应契约。
//!
//! 字段名保持前端既有的 snake_case 线上契约（access_token、age_sec、
//! channel_count 等），不做重命名。

use domain::{ChannelRecord, RawPayload, Snapshot};
use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
}

/// 当前用户信息响应体。
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub role: String,
    pub id: String,
}

/// 设备列表单项。
#[derive(Debug, Serialize)]
pub struct DeviceListItem {
    pub country: String,
    pub site_id: String,
    pub model: String,
    pub device_id: String,
    pub last_seen: i64,
    pub last_type: String,
    pub last_topic: String,
    pub age_sec: f64,
    pub online: bool,
    pub last_payload: RawPayload,
    pub summary_value: Snapshot,
    pub channels: Vec<ChannelRecord>,
    pub channel_count: usize,
    pub kw: Option<f64>,
    pub pf: Option<f64>,
    pub device_topic: String,
    pub device_short: String,
    pub device_display: String,
}

/// 设备列表响应体。
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub items: Vec<DeviceListItem>,
    pub count: usize,
}

/// 单设备最新状态响应体；快照字段平铺到顶层，便于前端直接取值。
#[derive(Debug, Serialize)]
pub struct DeviceLatestResponse {
    pub key: String,
    pub online: bool,
    pub age_sec: f64,
    pub last_seen: i64,
    pub last_topic: String,
    pub payload: RawPayload,
    pub channels: Vec<ChannelRecord>,
    pub channel_count: usize,
    pub summary_value: Snapshot,
    #[serde(flatten)]
    pub summary: Snapshot,
}

/// 时序曲线查询参数。
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    #[serde(default)]
    pub device: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_series")]
    pub series: String,
    #[serde(default, rename = "from")]
    pub date_from: String,
    #[serde(default, rename = "to")]
    pub date_to: String,
    #[serde(default = "default_group")]
    pub group: String,
}

fn default_metric() -> String {
    "kwh".to_string()
}

fn default_series() -> String {
    "total".to_string()
}

fn default_group() -> String {
    "day".to_string()
}

/// 时序曲线元信息（回显查询参数）。
#[derive(Debug, Serialize)]
pub struct SeriesMeta {
    pub device: String,
    pub metric: String,
    pub series: String,
    pub from: String,
    pub to: String,
    pub group: String,
}

/// 时序曲线单行。
#[derive(Debug, Serialize)]
pub struct SeriesRow {
    pub t: String,
    pub v: f64,
}

/// 时序曲线响应体。
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub meta: SeriesMeta,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub rows: Vec<SeriesRow>,
}

/// 报表导出请求体。
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default = "default_report_title")]
    pub title: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_series")]
    pub series: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

fn default_report_title() -> String {
    "Period Analysis".to_string()
}

/// 采集指标快照响应体。
#[derive(Debug, Serialize)]
pub struct MetricsSnapshotDto {
    pub raw_events: u64,
    pub dropped_topic: u64,
    pub payload_fallback: u64,
    pub cache_upserts: u64,
    pub sink_write_success: u64,
    pub sink_write_failure: u64,
    pub broadcast_enqueued: u64,
    pub broadcast_dropped: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
}
