use async_trait::async_trait;
use domain::RawEvent;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// RawEvent 处理器。
///
/// 处理器返回的错误只记日志，不得中断采集源的事件循环。
#[async_trait]
pub trait RawEventHandler: Send + Sync {
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 订阅主题（通配形式，例如 `th/#`）。
    pub topic: String,
}

/// MQTT 采集源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError> {
        let client_id = format!("meterd-reader-{}", now_epoch_ms());
        let mut options =
            rumqttc::MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(60));
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = rumqttc::AsyncClient::new(options, 10);
        client
            .subscribe(self.config.topic.clone(), rumqttc::QoS::AtMostOnce)
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        info!(
            target: "meterd.ingest",
            topic = %self.config.topic,
            "mqtt_subscribed"
        );

        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    let event = RawEvent {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                        received_at_ms: now_epoch_ms(),
                    };
                    if let Err(err) = handler.handle(event).await {
                        warn!(target: "meterd.ingest", error = %err, "raw event handler failed");
                    }
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    info!(
                        target: "meterd.ingest",
                        host = %self.config.host,
                        port = self.config.port,
                        "mqtt_connected"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    // 连接中断时等一拍再让 eventloop 重连，事件循环本身不退出
                    warn!(target: "meterd.ingest", error = %err, "mqtt_connection_error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
