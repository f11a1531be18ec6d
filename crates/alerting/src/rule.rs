//! Alert Types and Threshold Evaluation

use aqi_core::AirSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of condition a user can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Pm10High,
    Pm25High,
    Co2High,
    TemperatureHigh,
    HumidityHigh,
    AqiWarning,
}

impl AlertType {
    pub const ALL: [AlertType; 6] = [
        AlertType::Pm10High,
        AlertType::Pm25High,
        AlertType::Co2High,
        AlertType::TemperatureHigh,
        AlertType::HumidityHigh,
        AlertType::AqiWarning,
    ];

    /// Stored name
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Pm10High => "pm10_high",
            AlertType::Pm25High => "pm25_high",
            AlertType::Co2High => "co2_high",
            AlertType::TemperatureHigh => "temperature_high",
            AlertType::HumidityHigh => "humidity_high",
            AlertType::AqiWarning => "aqi_warning",
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::Pm10High => "PM10 High",
            AlertType::Pm25High => "PM2.5 High",
            AlertType::Co2High => "CO2 High",
            AlertType::TemperatureHigh => "Temperature High",
            AlertType::HumidityHigh => "Humidity High",
            AlertType::AqiWarning => "AQI Warning",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown alert type: {0}")]
pub struct ParseAlertTypeError(pub String);

impl FromStr for AlertType {
    type Err = ParseAlertTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseAlertTypeError(s.to_string()))
    }
}

/// An enabled threshold rule owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub user_id: i64,
    pub alert_type: AlertType,
    pub threshold: f64,
}

/// A rule that fired against a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub user_id: i64,
    pub alert_type: AlertType,
    pub message: String,
}

/// Check one threshold against a sample.
///
/// Fires when the measured value is strictly above the threshold and
/// returns the user-facing message.
pub fn evaluate(alert_type: AlertType, threshold: f64, sample: &AirSample, aqi: u32) -> Option<String> {
    let t = threshold;
    match alert_type {
        AlertType::Pm10High if sample.pm10 > t => Some(format!(
            "PM10 level ({:.1} μg/m³) exceeds threshold of {} μg/m³",
            sample.pm10, t
        )),
        AlertType::Pm25High if sample.pm25 > t => Some(format!(
            "PM2.5 level ({:.1} μg/m³) exceeds threshold of {} μg/m³",
            sample.pm25, t
        )),
        AlertType::Co2High if sample.co2 > t => Some(format!(
            "CO2 level ({:.0} ppm) exceeds threshold of {} ppm",
            sample.co2, t
        )),
        AlertType::TemperatureHigh if sample.temperature > t => Some(format!(
            "Temperature ({:.1}°C) exceeds threshold of {}°C",
            sample.temperature, t
        )),
        AlertType::HumidityHigh if sample.humidity > t => Some(format!(
            "Humidity ({:.1}%) exceeds threshold of {}%",
            sample.humidity, t
        )),
        AlertType::AqiWarning if f64::from(aqi) > t => {
            Some(format!("AQI ({}) exceeds threshold of {}", aqi, t))
        }
        _ => None,
    }
}
