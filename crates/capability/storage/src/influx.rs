//! InfluxDB v2 写入实现。
//!
//! 每条消息展开为一个 summary 点加每通道一个 channel 点，以 line
//! protocol（纳秒时间戳）经 `/api/v2/write` 提交。没有任何字段的点
//! 不合法，直接跳过。

use crate::error::StorageError;
use crate::traits::MeasurementSink;
use domain::{DeviceRecord, RawPayload};
use meterd_normalize::{build_channels, normalize};
use std::time::Duration;
use tracing::debug;

/// 后端不可达时单次写入的等待上限。
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// summary 点的字段输出顺序。
const SUMMARY_FIELDS: [&str; 14] = [
    "kw", "kwh", "v_avg", "a_avg", "pf_avg", "v_l1", "v_l2", "v_l3", "a_l1", "a_l2", "a_l3",
    "pf_l1", "pf_l2", "pf_l3",
];

/// Influx 连接配置。
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

/// InfluxDB v2 写入端。
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    token: String,
    org: String,
    bucket: String,
    measurement: String,
}

impl InfluxSink {
    pub fn new(config: InfluxConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(WRITE_TIMEOUT)
            .build()?;
        let write_url = format!("{}/api/v2/write", config.url.trim_end_matches('/'));
        Ok(Self {
            client,
            write_url,
            token: config.token,
            org: config.org,
            bucket: config.bucket,
            measurement: config.measurement,
        })
    }
}

#[async_trait::async_trait]
impl MeasurementSink for InfluxSink {
    async fn write(
        &self,
        record: &DeviceRecord,
        payload: &RawPayload,
        ts_ms: i64,
    ) -> Result<(), StorageError> {
        let lines = build_lines(&self.measurement, record, payload, ts_ms);
        if lines.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .post(&self.write_url)
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(lines.join("\n"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StorageError::new(format!(
                "influx write failed: {} {}",
                status, detail
            )));
        }
        Ok(())
    }
}

/// 空写入端：Influx 未配置时替身，写入是记录一条日志的 no-op。
#[derive(Debug, Default)]
pub struct NoopSink;

#[async_trait::async_trait]
impl MeasurementSink for NoopSink {
    async fn write(
        &self,
        record: &DeviceRecord,
        _payload: &RawPayload,
        _ts_ms: i64,
    ) -> Result<(), StorageError> {
        debug!(
            target: "meterd.sink",
            device_id = %record.device_id,
            "sink_disabled_write_skipped"
        );
        Ok(())
    }
}

/// 把一条消息展开为 line protocol 行（summary + channels）。
fn build_lines(
    measurement: &str,
    record: &DeviceRecord,
    payload: &RawPayload,
    ts_ms: i64,
) -> Vec<String> {
    let snapshot = normalize(payload);
    let channels = build_channels(payload);
    let ts_ns = ts_ms.saturating_mul(1_000_000);
    let mut lines = Vec::with_capacity(1 + channels.len());

    let base_tags = format!(
        "country={},site_id={},model={},device_id={},type={}",
        escape_tag(&record.country),
        escape_tag(&record.site_id),
        escape_tag(&record.model),
        escape_tag(&record.device_id),
        escape_tag(&record.last_type),
    );

    let mut fields: Vec<String> = Vec::new();
    let values = [
        snapshot.kw,
        snapshot.kwh,
        snapshot.v_avg,
        snapshot.a_avg,
        snapshot.pf_avg,
        snapshot.v_l1,
        snapshot.v_l2,
        snapshot.v_l3,
        snapshot.a_l1,
        snapshot.a_l2,
        snapshot.a_l3,
        snapshot.pf_l1,
        snapshot.pf_l2,
        snapshot.pf_l3,
    ];
    for (name, value) in SUMMARY_FIELDS.iter().zip(values) {
        if let Some(value) = value {
            fields.push(format!("{}={}", name, value));
        }
    }
    if let Some(di) = &snapshot.di {
        for (slot, bit) in di {
            if let Some(bit) = bit {
                fields.push(format!("di{}={}i", slot, bit));
            }
        }
    }
    if !fields.is_empty() {
        lines.push(format!(
            "{},{},scope=summary {} {}",
            escape_measurement(measurement),
            base_tags,
            fields.join(","),
            ts_ns
        ));
    }

    for channel in &channels {
        let mut fields: Vec<String> = Vec::new();
        for (name, value) in [
            ("v", channel.v),
            ("a", channel.a),
            ("kw", channel.kw),
            ("pf", channel.pf),
        ] {
            if let Some(value) = value {
                fields.push(format!("{}={}", name, value));
            }
        }
        if fields.is_empty() {
            continue;
        }
        lines.push(format!(
            "{},{},scope=channel,term={},phase={} {} {}",
            escape_measurement(measurement),
            base_tags,
            escape_tag(&channel.term),
            escape_tag(&channel.phase),
            fields.join(","),
            ts_ns
        ));
    }

    lines
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
