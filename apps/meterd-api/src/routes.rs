//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查：/health
//! - 认证接口：/api/auth/login, /api/auth/me
//! - 设备查询：/api/devices, /api/device/latest
//! - 时序曲线：/api/series
//! - 报表导出：/api/report/csv
//! - 采集指标：/api/metrics
//! - 实时推送：/ws/telemetry

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/devices", get(list_devices))
        .route("/api/device/latest", get(device_latest))
        .route("/api/series", get(get_series))
        .route("/api/report/csv", post(report_csv))
        .route("/api/metrics", get(get_metrics))
        .route("/ws/telemetry", get(ws_telemetry))
}
