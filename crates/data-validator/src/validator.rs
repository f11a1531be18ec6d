//! Data Validator for Range Checking

use crate::error::ValidationError;
use aqi_core::{AirSample, Parameter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// PM10 accepted range (μg/m³)
    pub pm10_range: (f64, f64),
    /// PM2.5 accepted range (μg/m³)
    pub pm25_range: (f64, f64),
    /// CO2 accepted range (ppm)
    pub co2_range: (f64, f64),
    /// Relative humidity accepted range (%)
    pub humidity_range: (f64, f64),
    /// Temperature accepted range (°C)
    pub temperature_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            pm10_range: (0.0, 1000.0),
            pm25_range: (0.0, 1000.0),
            co2_range: (0.0, 10_000.0),
            humidity_range: (0.0, 100.0),
            temperature_range: (-50.0, 100.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create a result from collected errors
    pub fn from_errors(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            fields_checked,
        }
    }

    /// Human-readable summary of all errors
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Status of a physical sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Active,
    Warning,
}

/// Health of one sensor for the current sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorHealth {
    pub name: &'static str,
    pub parameter: Parameter,
    pub value: f64,
    pub unit: &'static str,
    pub status: SensorStatus,
}

/// Nominal operating range of each sensor
fn nominal_range(parameter: Parameter) -> (f64, f64) {
    match parameter {
        Parameter::Pm10 | Parameter::Pm25 => (0.0, 500.0),
        Parameter::Co2 => (400.0, 5000.0),
        Parameter::Humidity => (0.0, 100.0),
        Parameter::Temperature => (-40.0, 85.0),
    }
}

fn sensor_name(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Pm10 => "PM10 Sensor",
        Parameter::Pm25 => "PM2.5 Sensor",
        Parameter::Co2 => "CO2 Sensor",
        Parameter::Humidity => "Humidity Sensor",
        Parameter::Temperature => "Temperature Sensor",
    }
}

fn field_name(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Pm10 => "pm10",
        Parameter::Pm25 => "pm25",
        Parameter::Co2 => "co2",
        Parameter::Humidity => "humidity",
        Parameter::Temperature => "temperature",
    }
}

/// Data validator for air-quality samples
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(field));
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn range_for(&self, parameter: Parameter) -> (f64, f64) {
        match parameter {
            Parameter::Pm10 => self.config.pm10_range,
            Parameter::Pm25 => self.config.pm25_range,
            Parameter::Co2 => self.config.co2_range,
            Parameter::Humidity => self.config.humidity_range,
            Parameter::Temperature => self.config.temperature_range,
        }
    }

    /// Validate every field of a sample, collecting all violations
    pub fn validate_reading(&self, sample: &AirSample) -> ValidationResult {
        let errors: Vec<_> = Parameter::ALL
            .iter()
            .filter_map(|p| {
                self.validate_range(field_name(*p), p.value_of(sample), self.range_for(*p))
                    .err()
            })
            .collect();

        if !errors.is_empty() {
            debug!("Reading rejected with {} error(s)", errors.len());
        }

        ValidationResult::from_errors(errors, Parameter::ALL.len())
    }

    /// Classify each sensor as active or warning from its nominal range
    pub fn sensor_health(&self, sample: &AirSample) -> Vec<SensorHealth> {
        Parameter::ALL
            .iter()
            .map(|p| {
                let value = p.value_of(sample);
                let (min, max) = nominal_range(*p);
                let status = if value >= min && value <= max {
                    SensorStatus::Active
                } else {
                    SensorStatus::Warning
                };
                SensorHealth {
                    name: sensor_name(*p),
                    parameter: *p,
                    value,
                    unit: p.unit(),
                    status,
                }
            })
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
