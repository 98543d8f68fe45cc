//! 追踪与采集链路指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集链路指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 采集链路指标。
pub struct TelemetryMetrics {
    raw_events: AtomicU64,
    dropped_topic: AtomicU64,
    payload_fallback: AtomicU64,
    cache_upserts: AtomicU64,
    sink_write_success: AtomicU64,
    sink_write_failure: AtomicU64,
    broadcast_enqueued: AtomicU64,
    broadcast_dropped: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            raw_events: AtomicU64::new(0),
            dropped_topic: AtomicU64::new(0),
            payload_fallback: AtomicU64::new(0),
            cache_upserts: AtomicU64::new(0),
            sink_write_success: AtomicU64::new(0),
            sink_write_failure: AtomicU64::new(0),
            broadcast_enqueued: AtomicU64::new(0),
            broadcast_dropped: AtomicU64::new(0),
            sessions_opened: AtomicU64::new(0),
            sessions_closed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_events: self.raw_events.load(Ordering::Relaxed),
            dropped_topic: self.dropped_topic.load(Ordering::Relaxed),
            payload_fallback: self.payload_fallback.load(Ordering::Relaxed),
            cache_upserts: self.cache_upserts.load(Ordering::Relaxed),
            sink_write_success: self.sink_write_success.load(Ordering::Relaxed),
            sink_write_failure: self.sink_write_failure.load(Ordering::Relaxed),
            broadcast_enqueued: self.broadcast_enqueued.load(Ordering::Relaxed),
            broadcast_dropped: self.broadcast_dropped.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到原始消息次数。
pub fn record_raw_event() {
    metrics().raw_events.fetch_add(1, Ordering::Relaxed);
}

/// 记录主题不合法丢弃次数。
pub fn record_dropped_topic() {
    metrics().dropped_topic.fetch_add(1, Ordering::Relaxed);
}

/// 记录报文退化为原文包装次数。
pub fn record_payload_fallback() {
    metrics().payload_fallback.fetch_add(1, Ordering::Relaxed);
}

/// 记录缓存覆盖写次数。
pub fn record_cache_upsert() {
    metrics().cache_upserts.fetch_add(1, Ordering::Relaxed);
}

/// 记录时序写入成功次数。
pub fn record_sink_write_success() {
    metrics().sink_write_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录时序写入失败次数。
pub fn record_sink_write_failure() {
    metrics().sink_write_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录广播事件入队次数。
pub fn record_broadcast_enqueued() {
    metrics().broadcast_enqueued.fetch_add(1, Ordering::Relaxed);
}

/// 记录广播事件被丢弃次数（分发端未就绪或队列满）。
pub fn record_broadcast_dropped() {
    metrics().broadcast_dropped.fetch_add(1, Ordering::Relaxed);
}

/// 记录实时会话建立次数。
pub fn record_session_opened() {
    metrics().sessions_opened.fetch_add(1, Ordering::Relaxed);
}

/// 记录实时会话结束次数。
pub fn record_session_closed() {
    metrics().sessions_closed.fetch_add(1, Ordering::Relaxed);
}
