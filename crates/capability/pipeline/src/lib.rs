//! 采集流水线能力。
//!
//! `IngestPipeline` 实现 `RawEventHandler`，对每条入站消息依次执行：
//! UTF-8 有损解码 → 主题解析 → 缓存覆盖写 → 时序写入 → 实时广播。
//! 时序与广播两步都是尽力而为：失败就地吸收，只记日志与指标，既不
//! 中断当前消息的其余步骤，也不影响下一条消息。同一设备键的缓存与
//! 时序状态按到达顺序生效。

use async_trait::async_trait;
use domain::{DeviceRecord, RawEvent, RawPayload, TelemetryEvent, make_key, parse_topic};
use meterd_ingest::{IngestError, RawEventHandler};
use meterd_normalize::{build_channels, normalize};
use meterd_realtime::TelemetryHub;
use meterd_storage::{DeviceStateStore, MeasurementSink};
use meterd_telemetry::{
    record_broadcast_dropped, record_broadcast_enqueued, record_cache_upsert,
    record_dropped_topic, record_payload_fallback, record_raw_event, record_sink_write_failure,
    record_sink_write_success,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 采集流水线。
pub struct IngestPipeline {
    cache: Arc<dyn DeviceStateStore>,
    sink: Arc<dyn MeasurementSink>,
    hub: TelemetryHub,
}

impl IngestPipeline {
    pub fn new(
        cache: Arc<dyn DeviceStateStore>,
        sink: Arc<dyn MeasurementSink>,
        hub: TelemetryHub,
    ) -> Self {
        Self { cache, sink, hub }
    }
}

#[async_trait]
impl RawEventHandler for IngestPipeline {
    /// 处理一条入站消息。永远返回 Ok：流水线内部的任何失败都不允许
    /// 进入采集源库的控制流。
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError> {
        record_raw_event();

        // 报文按 UTF-8 有损解码，坏字节替换
        let text = String::from_utf8_lossy(&event.payload).into_owned();

        // 主题不合法即丢弃：共享总线上的无关主题是预期噪音
        let Some((country, site_id, model, device_id, last_type)) = parse_topic(&event.topic)
        else {
            record_dropped_topic();
            debug!(target: "meterd.ingest", topic = %event.topic, "topic_skipped");
            return Ok(());
        };
        let key = make_key(&country, &site_id, &model, &device_id);

        // 对象报文直接保留，其余退化为原文包装
        let payload = RawPayload::from_text(&text);
        if payload.as_object().is_none() {
            record_payload_fallback();
        }

        info!(
            target: "meterd.ingest",
            key = %key,
            topic = %event.topic,
            payload_size = event.payload.len(),
            received_at_ms = event.received_at_ms,
            "raw_event_received"
        );

        let record = DeviceRecord {
            country,
            site_id,
            model,
            device_id,
            last_seen: event.received_at_ms,
            last_type,
            last_topic: event.topic.clone(),
        };

        // 缓存覆盖写：记录与报文成对换新
        match self
            .cache
            .upsert(&key, record.clone(), payload.clone())
            .await
        {
            Ok(()) => record_cache_upsert(),
            Err(err) => {
                warn!(target: "meterd.ingest", key = %key, error = %err, "cache_upsert_failed")
            }
        }

        // 时序写入：失败只记日志，不重试、不上抛
        match self
            .sink
            .write(&record, &payload, event.received_at_ms)
            .await
        {
            Ok(()) => record_sink_write_success(),
            Err(err) => {
                record_sink_write_failure();
                warn!(target: "meterd.ingest", key = %key, error = %err, "sink_write_failed");
            }
        }

        // 实时广播：移交给分发任务，队列满或未就绪时丢弃本条
        let summary = normalize(&payload);
        let channels = build_channels(&payload);
        let telemetry =
            TelemetryEvent::telemetry(event.received_at_ms, key, payload, summary, channels);
        if self.hub.broadcast(&telemetry) {
            record_broadcast_enqueued();
        } else {
            record_broadcast_dropped();
        }

        Ok(())
    }
}
