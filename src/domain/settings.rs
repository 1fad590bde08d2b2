// Controller communication settings and connection status
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Device/communication settings forwarded to the controller endpoint.
///
/// String-typed fields mirror the controller's own JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerSettings {
    pub serial_port: String,
    pub baud_rate: String,
    pub refresh_rate: String,
    pub password_protection: bool,
    pub connection_type: String,
    pub auto_backup: bool,
    pub sound_alerts: bool,
    pub data_logging: bool,
    pub temp_unit: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            serial_port: "COM3".to_string(),
            baud_rate: "9600".to_string(),
            refresh_rate: "5".to_string(),
            password_protection: false,
            connection_type: "serial".to_string(),
            auto_backup: true,
            sound_alerts: true,
            data_logging: true,
            temp_unit: "celsius".to_string(),
        }
    }
}

impl ControllerSettings {
    /// Refresh rate in seconds; unparsable or zero values yield None
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh_rate.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    /// The controller reports variants such as "Connected (Simulation Mode)"
    pub fn from_reported(status: &str) -> Self {
        if status.starts_with("Connected") {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}
