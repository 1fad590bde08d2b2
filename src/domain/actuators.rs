// Actuator and automatic-subsystem switch sets
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Actuator {
    Fan,
    WaterValve,
    RotationMotor,
    Heater,
}

impl FromStr for Actuator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan" => Ok(Actuator::Fan),
            "waterValve" => Ok(Actuator::WaterValve),
            "rotationMotor" => Ok(Actuator::RotationMotor),
            "heater" => Ok(Actuator::Heater),
            other => Err(format!("unknown actuator '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorStateSet {
    #[serde(default)]
    pub fan: bool,
    #[serde(default)]
    pub water_valve: bool,
    #[serde(default)]
    pub rotation_motor: bool,
    #[serde(default)]
    pub heater: bool,
}

impl ActuatorStateSet {
    pub fn all_off() -> Self {
        Self::default()
    }

    pub fn get(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Fan => self.fan,
            Actuator::WaterValve => self.water_valve,
            Actuator::RotationMotor => self.rotation_motor,
            Actuator::Heater => self.heater,
        }
    }

    pub fn set(&mut self, actuator: Actuator, on: bool) {
        let slot = match actuator {
            Actuator::Fan => &mut self.fan,
            Actuator::WaterValve => &mut self.water_valve,
            Actuator::RotationMotor => &mut self.rotation_motor,
            Actuator::Heater => &mut self.heater,
        };
        *slot = on;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoSubsystem {
    TemperatureControl,
    HumidityControl,
    RotationControl,
    VentilationControl,
}

impl FromStr for AutoSubsystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperatureControl" => Ok(AutoSubsystem::TemperatureControl),
            "humidityControl" => Ok(AutoSubsystem::HumidityControl),
            "rotationControl" => Ok(AutoSubsystem::RotationControl),
            "ventilationControl" => Ok(AutoSubsystem::VentilationControl),
            other => Err(format!("unknown automatic subsystem '{}'", other)),
        }
    }
}

/// Which regulation loops the controller runs while in automatic mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoControlSet {
    pub temperature_control: bool,
    pub humidity_control: bool,
    pub rotation_control: bool,
    pub ventilation_control: bool,
}

impl Default for AutoControlSet {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl AutoControlSet {
    pub fn all_enabled() -> Self {
        Self {
            temperature_control: true,
            humidity_control: true,
            rotation_control: true,
            ventilation_control: true,
        }
    }

    pub fn set(&mut self, subsystem: AutoSubsystem, enabled: bool) {
        let slot = match subsystem {
            AutoSubsystem::TemperatureControl => &mut self.temperature_control,
            AutoSubsystem::HumidityControl => &mut self.humidity_control,
            AutoSubsystem::RotationControl => &mut self.rotation_control,
            AutoSubsystem::VentilationControl => &mut self.ventilation_control,
        };
        *slot = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_states_json_shape() {
        let mut states = ActuatorStateSet::all_off();
        states.set(Actuator::WaterValve, true);

        let json = serde_json::to_value(states).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fan": false,
                "waterValve": true,
                "rotationMotor": false,
                "heater": false
            })
        );
    }

    #[test]
    fn test_partial_cached_states_default_to_off() {
        let states: ActuatorStateSet = serde_json::from_str(r#"{"fan":true}"#).unwrap();
        assert!(states.get(Actuator::Fan));
        assert!(!states.get(Actuator::Heater));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("rotationMotor".parse(), Ok(Actuator::RotationMotor));
        assert!("pump".parse::<Actuator>().is_err());
        assert_eq!("humidityControl".parse(), Ok(AutoSubsystem::HumidityControl));
    }
}
