//! System configuration parameters
//!
//! Wiring, broker, restart, and logging settings for the daemon.  Values
//! come from an optional TOML file; every missing field falls back to the
//! default for the reference carrier board.
//!
//! Loop timing (settle delay, backoff, escalation threshold, near-field
//! cut-off) is not configurable; the constants live in
//! [`drivers::enable`](crate::drivers::enable),
//! [`supervisor`](crate::supervisor), and [`sensors`](crate::sensors).

use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pins;
use crate::sensors::{SensorSlot, SlotId};

/// Environment variable consulted for the config path when no CLI
/// argument is given.
pub const CONFIG_PATH_ENV: &str = "DUALTOF_CONFIG";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Sensors ---
    /// I2C character device shared by both sensors
    pub i2c_bus: String,
    /// 7-bit address both sensors answer on
    pub i2c_address: u8,
    /// Kernel GPIO number gating sensor 1
    pub sensor_1_enable_line: u64,
    /// Kernel GPIO number gating sensor 2
    pub sensor_2_enable_line: u64,

    // --- Broker ---
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_keep_alive_secs: u16,
    pub mqtt_client_id: String,
    /// Topic for sensor 1 readings
    pub sensor_1_topic: String,
    /// Topic for sensor 2 readings
    pub sensor_2_topic: String,

    // --- Supervisor ---
    /// argv of the command that restarts this service
    pub restart_command: Vec<String>,

    // --- Logging ---
    /// Log file; `None` logs to stderr
    pub log_file: Option<String>,
    /// Default filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensors
            i2c_bus: pins::I2C_BUS.to_string(),
            i2c_address: pins::TOF_I2C_ADDRESS,
            sensor_1_enable_line: pins::SENSOR_1_ENABLE_LINE,
            sensor_2_enable_line: pins::SENSOR_2_ENABLE_LINE,

            // Broker
            mqtt_host: "192.168.123.1".to_string(),
            mqtt_port: 1883,
            mqtt_keep_alive_secs: 60,
            mqtt_client_id: "dualtof".to_string(),
            sensor_1_topic: "sensor/meter/1".to_string(),
            sensor_2_topic: "sensor/meter/2".to_string(),

            // Supervisor
            restart_command: ["sudo", "systemctl", "restart", "sensor.service"]
                .map(String::from)
                .to_vec(),

            // Logging
            log_file: Some("vl53l1x_dual_mqtt.log".to_string()),
            log_level: "info".to_string(),
        }
    }
}

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid TOML for this schema.
    Parse(String),
    /// A field failed validation.  Describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config read failed: {}", e),
            Self::Parse(msg) => write!(f, "config parse failed: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SystemConfig {
    /// Parse a TOML document.  Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and validate the config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.i2c_bus.is_empty() {
            return Err(ConfigError::ValidationFailed("i2c_bus is empty"));
        }
        if self.i2c_address > 0x7F {
            return Err(ConfigError::ValidationFailed("i2c_address is not a 7-bit address"));
        }
        if self.sensor_1_enable_line == self.sensor_2_enable_line {
            return Err(ConfigError::ValidationFailed(
                "sensor_1_enable_line and sensor_2_enable_line must differ",
            ));
        }
        if self.mqtt_host.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_host is empty"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_port is 0"));
        }
        if self.sensor_1_topic.is_empty() || self.sensor_2_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("sensor topics must not be empty"));
        }
        if self.sensor_1_topic == self.sensor_2_topic {
            return Err(ConfigError::ValidationFailed("sensor topics must differ"));
        }
        if self.restart_command.first().is_none_or(String::is_empty) {
            return Err(ConfigError::ValidationFailed("restart_command is empty"));
        }
        Ok(())
    }

    /// Wiring for both slots, in cycle order.
    pub fn slots(&self) -> [SensorSlot; 2] {
        SlotId::ALL.map(|id| {
            let (enable_line, default_line, default_label, topic) = match id {
                SlotId::One => (
                    self.sensor_1_enable_line,
                    pins::SENSOR_1_ENABLE_LINE,
                    pins::SENSOR_1_ENABLE_LABEL,
                    &self.sensor_1_topic,
                ),
                SlotId::Two => (
                    self.sensor_2_enable_line,
                    pins::SENSOR_2_ENABLE_LINE,
                    pins::SENSOR_2_ENABLE_LABEL,
                    &self.sensor_2_topic,
                ),
            };
            // Board labels only hold for the reference wiring.
            let enable_label = if enable_line == default_line {
                default_label.to_string()
            } else {
                format!("gpio{}", enable_line)
            };
            SensorSlot {
                id,
                enable_line,
                enable_label,
                bus: self.i2c_bus.clone(),
                address: self.i2c_address,
                topic: topic.clone(),
            }
        })
    }
}
