//! Location Comparison

use crate::{calculate_aqi, AirSample};
use serde::{Deserialize, Serialize};

/// Verdict when both locations score the same
pub const EQUALLY_SAFE: &str = "Both locations are equally safe";

/// Number of parameters (0-5) within their acceptable limit
pub fn location_safety(sample: &AirSample) -> u8 {
    [
        sample.pm10 <= 100.0,
        sample.pm25 <= 60.0,
        sample.co2 <= 1000.0,
        sample.humidity <= 70.0,
        sample.temperature <= 40.0,
    ]
    .iter()
    .filter(|ok| **ok)
    .count() as u8
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub name: String,
    pub sample: AirSample,
    pub aqi: u32,
    pub safety: u8,
}

impl LocationReport {
    pub fn new(name: impl Into<String>, sample: AirSample) -> Self {
        Self {
            name: name.into(),
            aqi: calculate_aqi(sample.pm25),
            safety: location_safety(&sample),
            sample,
        }
    }
}

/// Result of comparing two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub first: LocationReport,
    pub second: LocationReport,
    /// Name of the safer location, or [`EQUALLY_SAFE`]
    pub safer: String,
}

/// Compare two named samples by their safety count
pub fn compare_locations(first: LocationReport, second: LocationReport) -> Comparison {
    let safer = match first.safety.cmp(&second.safety) {
        std::cmp::Ordering::Greater => first.name.clone(),
        std::cmp::Ordering::Less => second.name.clone(),
        std::cmp::Ordering::Equal => EQUALLY_SAFE.to_string(),
    };

    Comparison {
        first,
        second,
        safer,
    }
}
