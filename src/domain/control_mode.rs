// Control mode - manual vs automatic operation of the incubator
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Manual,
    #[default]
    Automatic,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Manual => "manual",
            ControlMode::Automatic => "automatic",
        }
    }

    /// Actuators accept user writes only in manual mode
    pub fn allows_actuator_writes(&self) -> bool {
        matches!(self, ControlMode::Manual)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown control mode '{0}'")]
pub struct UnknownControlMode(pub String);

impl FromStr for ControlMode {
    type Err = UnknownControlMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ControlMode::Manual),
            "automatic" => Ok(ControlMode::Automatic),
            other => Err(UnknownControlMode(other.to_string())),
        }
    }
}
