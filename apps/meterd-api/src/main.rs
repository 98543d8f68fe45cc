//! meterd API 服务：电表遥测接入、设备状态查询与实时推送。
//!
//! 启动顺序：配置 → 日志 → 认证目录 → 设备缓存 → 时序写入端 →
//! 广播分发任务 → 采集任务 → HTTP/WS 服务。

mod handlers;
mod ingest;
mod middleware;
mod routes;
mod utils;

use meterd_auth::{AuthService, JwtManager, UserDirectory};
use meterd_config::AppConfig;
use meterd_realtime::TelemetryHub;
use meterd_storage::{DeviceStateStore, InMemoryDeviceState};
use meterd_telemetry::init_tracing;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 各 handler 共享的应用状态。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub cache: Arc<dyn DeviceStateStore>,
    pub hub: TelemetryHub,
    pub online_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 内置用户目录 + JWT 管理器
    let directory = UserDirectory::seed(
        &config.admin_email,
        &config.admin_password,
        &config.user_email,
        &config.user_password,
    )?;
    let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_ttl_seconds);
    let auth = Arc::new(AuthService::new(directory, jwt));

    // 设备状态缓存由应用根显式构造，经 AppState 注入各处
    let cache: Arc<dyn DeviceStateStore> = Arc::new(InMemoryDeviceState::new());

    // 广播分发任务先于采集启动，避免启动竞态丢事件
    let hub = TelemetryHub::spawn();

    // 时序写入端 + 采集任务
    let sink = ingest::build_sink(&config)?;
    ingest::spawn_ingest(&config, cache.clone(), sink, hub.clone());

    let state = AppState {
        auth,
        cache,
        hub,
        online_seconds: config.online_seconds,
    };

    let app = routes::create_api_router()
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(axum::middleware::from_fn(middleware::request_context))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!("listening on {}", config.http_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
