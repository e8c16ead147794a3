//! Infrastructure layer - Serial port, MQTT broker and configuration

pub mod config;
pub mod drivers;
pub mod messaging;

pub use config::BridgeConfig;
pub use drivers::{SerialConfig, SerialLineReader};
pub use messaging::MqttClient;
