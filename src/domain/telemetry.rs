// Sensor reading domain model
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl SensorReading {
    pub fn new(temperature: f64, humidity: f64, recorded_at: Option<DateTime<Utc>>) -> Self {
        Self {
            temperature,
            humidity,
            recorded_at,
        }
    }
}
