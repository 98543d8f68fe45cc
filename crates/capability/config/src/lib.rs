//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
///
/// MQTT 主机缺省时不启动采集；Influx 四项（url/token/org/bucket）不全时
/// 写入退化为 no-op。两者都不是启动错误。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub mqtt_host: Option<String>,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic: String,
    pub influx_url: Option<String>,
    pub influx_token: Option<String>,
    pub influx_org: Option<String>,
    pub influx_bucket: Option<String>,
    pub influx_measurement: String,
    pub online_seconds: u64,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: u64,
    pub admin_email: String,
    pub admin_password: String,
    pub user_email: String,
    pub user_password: String,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("METERD_JWT_SECRET")
            .map_err(|_| ConfigError::Missing("METERD_JWT_SECRET".to_string()))?;
        let jwt_ttl_seconds = read_u64_with_default("METERD_JWT_TTL_SECONDS", 86_400)?;
        let http_addr =
            env::var("METERD_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let mqtt_host = read_optional("METERD_MQTT_HOST");
        let mqtt_port = read_u16_with_default("METERD_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("METERD_MQTT_USERNAME");
        let mqtt_password = read_optional("METERD_MQTT_PASSWORD");
        let mqtt_topic = env::var("METERD_MQTT_TOPIC").unwrap_or_else(|_| "th/#".to_string());
        let influx_url = read_optional("METERD_INFLUX_URL");
        let influx_token = read_optional("METERD_INFLUX_TOKEN");
        let influx_org = read_optional("METERD_INFLUX_ORG");
        let influx_bucket = read_optional("METERD_INFLUX_BUCKET");
        let influx_measurement =
            env::var("METERD_INFLUX_MEASUREMENT").unwrap_or_else(|_| "power".to_string());
        let online_seconds = read_u64_with_default("METERD_ONLINE_SECONDS", 60)?;
        let admin_email =
            env::var("METERD_ADMIN_EMAIL").unwrap_or_else(|_| "admin@local".to_string());
        let admin_password =
            env::var("METERD_ADMIN_PASSWORD").unwrap_or_else(|_| "admin1234".to_string());
        let user_email =
            env::var("METERD_USER_EMAIL").unwrap_or_else(|_| "user@local".to_string());
        let user_password =
            env::var("METERD_USER_PASSWORD").unwrap_or_else(|_| "user1234".to_string());

        Ok(Self {
            http_addr,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_topic,
            influx_url,
            influx_token,
            influx_org,
            influx_bucket,
            influx_measurement,
            online_seconds,
            jwt_secret,
            jwt_ttl_seconds,
            admin_email,
            admin_password,
            user_email,
            user_password,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
