use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 接入层原始事件。
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

/// 设备元数据记录。
///
/// 每条入站消息对该键的记录整体覆盖（last-write-wins），进程生命周期内
/// 不删除；"离线" 由 last_seen 的年龄派生，不是存储状态。
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub country: String,
    pub site_id: String,
    pub model: String,
    pub device_id: String,
    /// 最近一次收到消息的时间（epoch 毫秒）。
    pub last_seen: i64,
    pub last_type: String,
    pub last_topic: String,
}

/// 最近一次原始报文：JSON 对象，或无法按对象解析时的原文包装。
#[derive(Debug, Clone)]
pub enum RawPayload {
    Object(Map<String, Value>),
    Raw(String),
}

impl RawPayload {
    /// 从报文文本构造。合法 JSON 对象直接保留；解析失败或解析出
    /// 非对象（裸数字/字符串/数组）时退化为原文包装。
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => RawPayload::Object(map),
            _ => RawPayload::Raw(text.to_string()),
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            RawPayload::Object(map) => Some(map),
            RawPayload::Raw(_) => None,
        }
    }
}

impl Serialize for RawPayload {
    /// Raw 形态对外序列化为 `{"_raw": <原文>}`。
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawPayload::Object(map) => map.serialize(serializer),
            RawPayload::Raw(text) => {
                let mut state = serializer.serialize_map(Some(1))?;
                state.serialize_entry("_raw", text)?;
                state.end()
            }
        }
    }
}

/// DI 槽位表：1..=16，值为 0/1 或 null。
pub type DiMap = BTreeMap<u8, Option<u8>>;

/// 规整后的数值快照。所有字段可缺失，缺失序列化为 null。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub kw: Option<f64>,
    pub kwh: Option<f64>,
    pub v_l1: Option<f64>,
    pub v_l2: Option<f64>,
    pub v_l3: Option<f64>,
    pub v_avg: Option<f64>,
    pub a_l1: Option<f64>,
    pub a_l2: Option<f64>,
    pub a_l3: Option<f64>,
    pub a_avg: Option<f64>,
    pub pf_l1: Option<f64>,
    pub pf_l2: Option<f64>,
    pub pf_l3: Option<f64>,
    pub pf_avg: Option<f64>,
    /// 完全没有 DI 来源时为 None（不是全 null 的槽位表）。
    pub di: Option<DiMap>,
}

/// 单个相位通道读数。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecord {
    pub term: String,
    pub phase: String,
    pub v: Option<f64>,
    pub a: Option<f64>,
    pub kw: Option<f64>,
    pub pf: Option<f64>,
}

/// 推送给实时查看端的遥测事件。
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// 事件时间（epoch 毫秒）。
    pub ts: i64,
    pub key: String,
    pub payload: RawPayload,
    pub summary: Snapshot,
    pub channels: Vec<ChannelRecord>,
    pub channel_count: usize,
}

impl TelemetryEvent {
    pub fn telemetry(
        ts: i64,
        key: String,
        payload: RawPayload,
        summary: Snapshot,
        channels: Vec<ChannelRecord>,
    ) -> Self {
        let channel_count = channels.len();
        Self {
            event_type: "telemetry",
            ts,
            key,
            payload,
            summary,
            channels,
            channel_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_payload_object_kept() {
        let payload = RawPayload::from_text(r#"{"v": 220}"#);
        let map = payload.as_object().expect("object");
        assert_eq!(map.get("v"), Some(&Value::from(220)));
    }

    #[test]
    fn raw_payload_non_object_wrapped() {
        for text in ["42", "\"hello\"", "[1,2]", "not json at all"] {
            let payload = RawPayload::from_text(text);
            assert!(payload.as_object().is_none());
            let json = serde_json::to_value(&payload).expect("serialize");
            assert_eq!(json, serde_json::json!({ "_raw": text }));
        }
    }

    #[test]
    fn snapshot_absent_fields_serialize_as_null() {
        let snapshot = Snapshot {
            kw: Some(3.2),
            ..Snapshot::default()
        };
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["kw"], serde_json::json!(3.2));
        assert_eq!(json["v_avg"], Value::Null);
        assert_eq!(json["di"], Value::Null);
    }

    #[test]
    fn telemetry_event_shape() {
        let event = TelemetryEvent::telemetry(
            1_700_000_000_000,
            "th/site001/pg46/001".to_string(),
            RawPayload::from_text(r#"{"v": 220}"#),
            Snapshot::default(),
            Vec::new(),
        );
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "telemetry");
        assert_eq!(json["channel_count"], 0);
        assert_eq!(json["key"], "th/site001/pg46/001");
    }
}
