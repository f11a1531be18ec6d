//! Air Quality Index Core
//!
//! Provides the US EPA PM2.5 AQI formula, AQI categories and the
//! guidance derived from them (parameter status, safety score, activity
//! recommendations, personalized risk and location comparison).

mod breakpoints;
mod compare;
mod guidance;
mod level;

pub use breakpoints::{calculate_aqi, Breakpoint, PM25_BREAKPOINTS};
pub use compare::{compare_locations, location_safety, Comparison, LocationReport, EQUALLY_SAFE};
pub use guidance::{
    activity_recommendations, is_emergency, parameter_status, personal_risk, safety_score,
    AgeGroup, HealthCondition, ParameterLevel, ParameterStatus, PersonalRisk, Recommendation,
    RiskBand, RiskLevel, SafetyScore,
};
pub use level::{AqiInfo, AqiLevel};

use serde::{Deserialize, Serialize};

/// One set of air-quality measurements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirSample {
    /// PM10 concentration (μg/m³)
    pub pm10: f64,
    /// PM2.5 concentration (μg/m³)
    pub pm25: f64,
    /// CO2 concentration (ppm)
    pub co2: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Temperature (°C)
    pub temperature: f64,
}

impl AirSample {
    /// AQI derived from this sample's PM2.5
    pub fn aqi(&self) -> u32 {
        calculate_aqi(self.pm25)
    }
}

/// Measured parameters with their own status thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Pm10,
    Pm25,
    Co2,
    Humidity,
    Temperature,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::Pm10,
        Parameter::Pm25,
        Parameter::Co2,
        Parameter::Humidity,
        Parameter::Temperature,
    ];

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Pm10 | Parameter::Pm25 => "μg/m³",
            Parameter::Co2 => "ppm",
            Parameter::Humidity => "%",
            Parameter::Temperature => "°C",
        }
    }

    /// Read this parameter from a sample
    pub fn value_of(&self, sample: &AirSample) -> f64 {
        match self {
            Parameter::Pm10 => sample.pm10,
            Parameter::Pm25 => sample.pm25,
            Parameter::Co2 => sample.co2,
            Parameter::Humidity => sample.humidity,
            Parameter::Temperature => sample.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_aqi_uses_pm25() {
        let sample = AirSample {
            pm10: 400.0,
            pm25: 12.0,
            co2: 450.0,
            humidity: 50.0,
            temperature: 22.0,
        };
        assert_eq!(sample.aqi(), 50);
    }

    #[test]
    fn test_parameter_serde_names() {
        let json = serde_json::to_string(&Parameter::Pm25).unwrap();
        assert_eq!(json, "\"pm25\"");
        assert_eq!(Parameter::Co2.value_of(&AirSample { co2: 900.0, ..Default::default() }), 900.0);
    }
}
