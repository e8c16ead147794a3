use config::{Config, ConfigError, Environment, File};
use domain::DomainError;
use serde::{Deserialize, Serialize};

use crate::drivers::SerialConfig;

pub const DEFAULT_BROKER_URL: &str = "mqtt://localhost:1883";
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_ROOM: &str = "Sala 101";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MqttConfig {
    #[serde(default = "default_broker_url")]
    pub broker_url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_broker_url() -> String {
    DEFAULT_BROKER_URL.to_string()
}
fn default_client_id() -> String {
    "rfid-serial-bridge".to_string()
}
fn default_keep_alive() -> u64 {
    20
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

/// Broker address split out of `broker_url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl MqttConfig {
    /// Accepts `[mqtt://|tcp://]host[:port]`
    pub fn broker_address(&self) -> Result<BrokerAddress, DomainError> {
        let url = self.broker_url.trim();
        let rest = url
            .strip_prefix("mqtt://")
            .or_else(|| url.strip_prefix("tcp://"))
            .unwrap_or(url);
        let rest = rest.trim_end_matches('/');

        if rest.contains("://") {
            return Err(DomainError::InvalidConfiguration(format!(
                "Unsupported broker scheme: {}",
                url
            )));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    DomainError::InvalidConfiguration(format!("Invalid broker port in {}", url))
                })?;
                (host, port)
            }
            None => (rest, DEFAULT_MQTT_PORT),
        };

        if host.is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "Missing broker host in {:?}",
                url
            )));
        }

        Ok(BrokerAddress {
            host: host.to_string(),
            port,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttendanceConfig {
    /// Room used when a tag read does not name one
    #[serde(default = "default_room")]
    pub default_room: String,
}

fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            default_room: default_room(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub attendance: AttendanceConfig,
}

impl BridgeConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("mqtt.broker_url", DEFAULT_BROKER_URL)?
            .set_default("attendance.default_room", DEFAULT_ROOM)?
            // Shared settings
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per-environment overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. BRIDGE__MQTT__BROKER_URL=mqtt://10.0.0.1)
            .add_source(Environment::with_prefix("BRIDGE").separator("__"))
            .build()?;

        let mut config: Self = s.try_deserialize()?;
        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Honour the plain `MQTT_BROKER_URL` and `ROOM_NAME` variables older
    /// deployments set.
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MQTT_BROKER_URL").filter(|v| !v.trim().is_empty()) {
            self.mqtt.broker_url = url;
        }
        if let Some(room) = lookup("ROOM_NAME").filter(|v| !v.trim().is_empty()) {
            self.attendance.default_room = room;
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.mqtt.broker_address()?;

        if self.attendance.default_room.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "Default room must not be empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(DomainError::InvalidConfiguration(
                "Baud rate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
