//! 在线状态判定辅助。
//!
//! "离线" 不是存储状态，而是 last_seen 年龄超过阈值的派生属性。

use std::time::{SystemTime, UNIX_EPOCH};

/// 距上次消息的秒龄。时钟回拨或未来时间戳产生的负龄钳制为 0。
pub fn age_seconds(last_seen_ms: i64, now_ms: i64) -> f64 {
    now_ms.saturating_sub(last_seen_ms).max(0) as f64 / 1000.0
}

/// 年龄低于阈值即在线。
pub fn is_online(last_seen_ms: i64, now_ms: i64, threshold_seconds: u64) -> bool {
    age_seconds(last_seen_ms, now_ms) < threshold_seconds as f64
}

/// 当前 Unix 时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
