//! 采集链路装配模块
//!
//! 将数据采集的各个组件（MQTT 源、流水线、设备缓存、时序写入、广播）
//! 装配为完整的处理链路，并作为后台任务启动。MQTT 主机未配置时采集
//! 退化为空操作源；Influx 配置不全时写入退化为 no-op，两者都不阻止
//! 服务启动。

use meterd_config::AppConfig;
use meterd_ingest::{MqttSource, MqttSourceConfig, NoopSource, Source};
use meterd_pipeline::IngestPipeline;
use meterd_realtime::TelemetryHub;
use meterd_storage::{
    DeviceStateStore, InfluxConfig, InfluxSink, MeasurementSink, NoopSink, StorageError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// 按配置构造时序写入端。
pub fn build_sink(config: &AppConfig) -> Result<Arc<dyn MeasurementSink>, StorageError> {
    match (
        &config.influx_url,
        &config.influx_token,
        &config.influx_org,
        &config.influx_bucket,
    ) {
        (Some(url), Some(token), Some(org), Some(bucket)) => {
            info!(
                "influx sink: {} org={} bucket={} measurement={}",
                url, org, bucket, config.influx_measurement
            );
            let sink = InfluxSink::new(InfluxConfig {
                url: url.clone(),
                token: token.clone(),
                org: org.clone(),
                bucket: bucket.clone(),
                measurement: config.influx_measurement.clone(),
            })?;
            Ok(Arc::new(sink))
        }
        _ => {
            info!("influx sink: noop (Influx env incomplete)");
            Ok(Arc::new(NoopSink))
        }
    }
}

/// 启动采集任务。
pub fn spawn_ingest(
    config: &AppConfig,
    cache: Arc<dyn DeviceStateStore>,
    sink: Arc<dyn MeasurementSink>,
    hub: TelemetryHub,
) -> tokio::task::JoinHandle<()> {
    // 全局唯一的流水线处理器
    let handler = Arc::new(IngestPipeline::new(cache, sink, hub));

    // 按配置选择采集源
    let source: Arc<dyn Source> = match &config.mqtt_host {
        Some(host) => {
            let mqtt_config = MqttSourceConfig {
                host: host.clone(),
                port: config.mqtt_port,
                username: config.mqtt_username.clone(),
                password: config.mqtt_password.clone(),
                topic: config.mqtt_topic.clone(),
            };
            info!(
                "ingest source: mqtt {}:{} topic={}",
                mqtt_config.host, mqtt_config.port, mqtt_config.topic
            );
            Arc::new(MqttSource::new(mqtt_config))
        }
        None => {
            info!("ingest source: noop (METERD_MQTT_HOST empty)");
            Arc::new(NoopSource)
        }
    };

    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!("ingest stopped: {}", err);
        }
    })
}
