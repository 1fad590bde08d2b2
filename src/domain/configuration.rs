// Configuration draft - bounds-based working copy of a profile's targets
use super::egg_type::{EggTypeProfile, EggTypeUpdate, ProfileRow};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FAN_RUN_TIME_SECONDS: u32 = 30;
pub const DEFAULT_HEATER_POWER_PERCENT: i32 = 75;

/// Distance between a profile's target and the derived lower bound
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DraftMargins {
    pub temperature: f64,
    pub humidity: f64,
}

impl Default for DraftMargins {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            humidity: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDraft {
    pub min_temp: f64,
    pub max_temp: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub rotation_interval_minutes: i64,
    pub fan_run_time_seconds: i64,
    pub heater_power_percent: i64,
}

/// A single broken rule of the draft validity predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftViolation {
    TemperatureRangeInverted,
    HumidityRangeInverted,
    RotationIntervalNotPositive,
    FanRunTimeNotPositive,
    HeaterPowerOutOfRange,
}

impl fmt::Display for DraftViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DraftViolation::TemperatureRangeInverted => {
                "minimum temperature must be below maximum temperature"
            }
            DraftViolation::HumidityRangeInverted => {
                "minimum humidity must be below maximum humidity"
            }
            DraftViolation::RotationIntervalNotPositive => "rotation interval must be positive",
            DraftViolation::FanRunTimeNotPositive => "fan run time must be positive",
            DraftViolation::HeaterPowerOutOfRange => "heater power must be between 0 and 100",
        };
        f.write_str(text)
    }
}

/// Field edits applied to a draft, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEdit {
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub max_temp: Option<f64>,
    #[serde(default)]
    pub min_humidity: Option<f64>,
    #[serde(default)]
    pub max_humidity: Option<f64>,
    #[serde(default)]
    pub rotation_interval_minutes: Option<i64>,
    #[serde(default)]
    pub fan_run_time_seconds: Option<i64>,
    #[serde(default)]
    pub heater_power_percent: Option<i64>,
}

impl ConfigurationDraft {
    /// Max bounds take the profile targets; min bounds sit a fixed margin below
    pub fn from_profile(profile: &EggTypeProfile, margins: DraftMargins) -> Self {
        Self {
            min_temp: profile.target_temperature - margins.temperature,
            max_temp: profile.target_temperature,
            min_humidity: profile.target_humidity - margins.humidity,
            max_humidity: profile.target_humidity,
            rotation_interval_minutes: profile.rotation_interval_minutes as i64,
            fan_run_time_seconds: DEFAULT_FAN_RUN_TIME_SECONDS as i64,
            heater_power_percent: DEFAULT_HEATER_POWER_PERCENT as i64,
        }
    }

    pub fn violations(&self) -> Vec<DraftViolation> {
        let mut violations = Vec::new();
        // Negated comparisons so NaN bounds count as violations
        if !(self.min_temp < self.max_temp) {
            violations.push(DraftViolation::TemperatureRangeInverted);
        }
        if !(self.min_humidity < self.max_humidity) {
            violations.push(DraftViolation::HumidityRangeInverted);
        }
        if self.rotation_interval_minutes <= 0 {
            violations.push(DraftViolation::RotationIntervalNotPositive);
        }
        if self.fan_run_time_seconds <= 0 {
            violations.push(DraftViolation::FanRunTimeNotPositive);
        }
        if !(0..=100).contains(&self.heater_power_percent) {
            violations.push(DraftViolation::HeaterPowerOutOfRange);
        }
        violations
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }

    pub fn apply(&mut self, edit: &DraftEdit) {
        if let Some(v) = edit.min_temp {
            self.min_temp = v;
        }
        if let Some(v) = edit.max_temp {
            self.max_temp = v;
        }
        if let Some(v) = edit.min_humidity {
            self.min_humidity = v;
        }
        if let Some(v) = edit.max_humidity {
            self.max_humidity = v;
        }
        if let Some(v) = edit.rotation_interval_minutes {
            self.rotation_interval_minutes = v;
        }
        if let Some(v) = edit.fan_run_time_seconds {
            self.fan_run_time_seconds = v;
        }
        if let Some(v) = edit.heater_power_percent {
            self.heater_power_percent = v;
        }
    }

    /// Row written back to the profile store; max bounds double as targets
    pub fn to_row(&self, egg_type: &str) -> ProfileRow {
        ProfileRow {
            egg_type: egg_type.to_string(),
            min_temp: Some(self.min_temp),
            max_temp: Some(self.max_temp),
            min_hum: Some(self.min_humidity),
            max_hum: Some(self.max_humidity),
            target_hum: Some(self.max_humidity),
            target_temp: Some(self.max_temp),
            rotation_interval: Some(self.rotation_interval_minutes as f64),
        }
    }

    /// Profile fields mirroring what is sent to the controller
    pub fn to_profile_update(&self) -> EggTypeUpdate {
        EggTypeUpdate {
            target_temperature: Some(self.max_temp),
            target_humidity: Some(self.max_humidity),
            rotation_interval_minutes: u32::try_from(self.rotation_interval_minutes).ok(),
            ..Default::default()
        }
    }
}
