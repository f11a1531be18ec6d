//! AQI Categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EPA AQI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiLevel {
    /// Category for an AQI value
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => AqiLevel::Good,
            51..=100 => AqiLevel::Moderate,
            101..=150 => AqiLevel::UnhealthySensitive,
            151..=200 => AqiLevel::Unhealthy,
            201..=300 => AqiLevel::VeryUnhealthy,
            _ => AqiLevel::Hazardous,
        }
    }

    /// Stable snake_case name, as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiLevel::Good => "good",
            AqiLevel::Moderate => "moderate",
            AqiLevel::UnhealthySensitive => "unhealthy_sensitive",
            AqiLevel::Unhealthy => "unhealthy",
            AqiLevel::VeryUnhealthy => "very_unhealthy",
            AqiLevel::Hazardous => "hazardous",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
            AqiLevel::Hazardous => "Hazardous",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Air quality is satisfactory",
            AqiLevel::Moderate => "Acceptable for most",
            AqiLevel::UnhealthySensitive => "Sensitive groups may be affected",
            AqiLevel::Unhealthy => "Everyone may begin to feel effects",
            AqiLevel::VeryUnhealthy => "Health alert",
            AqiLevel::Hazardous => "Health warning of emergency conditions",
        }
    }

    pub fn health_advice(&self) -> &'static str {
        match self {
            AqiLevel::Good => {
                "Air quality is considered satisfactory, and air pollution poses little or no risk."
            }
            AqiLevel::Moderate => {
                "Air quality is acceptable. However, there may be a risk for some people, \
                 particularly those who are unusually sensitive to air pollution."
            }
            AqiLevel::UnhealthySensitive => {
                "Members of sensitive groups may experience health effects. \
                 The general public is less likely to be affected."
            }
            AqiLevel::Unhealthy => {
                "Some members of the general public may experience health effects; \
                 members of sensitive groups may experience more serious health effects."
            }
            AqiLevel::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            }
            AqiLevel::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be affected."
            }
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AqiLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(AqiLevel::Good),
            "moderate" => Ok(AqiLevel::Moderate),
            "unhealthy_sensitive" => Ok(AqiLevel::UnhealthySensitive),
            "unhealthy" => Ok(AqiLevel::Unhealthy),
            "very_unhealthy" => Ok(AqiLevel::VeryUnhealthy),
            "hazardous" => Ok(AqiLevel::Hazardous),
            _ => Err(format!("unknown AQI level: {s}")),
        }
    }
}

/// AQI value with its category and guidance text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiInfo {
    pub value: u32,
    pub level: AqiLevel,
    pub label: String,
    pub description: String,
    pub health_advice: String,
}

impl AqiInfo {
    pub fn from_aqi(aqi: u32) -> Self {
        let level = AqiLevel::from_aqi(aqi);
        Self {
            value: aqi,
            level,
            label: level.label().to_string(),
            description: level.description().to_string(),
            health_advice: level.health_advice().to_string(),
        }
    }

    pub fn from_pm25(pm25: f64) -> Self {
        Self::from_aqi(crate::calculate_aqi(pm25))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(AqiLevel::from_aqi(0), AqiLevel::Good);
        assert_eq!(AqiLevel::from_aqi(50), AqiLevel::Good);
        assert_eq!(AqiLevel::from_aqi(51), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_aqi(100), AqiLevel::Moderate);
        assert_eq!(AqiLevel::from_aqi(150), AqiLevel::UnhealthySensitive);
        assert_eq!(AqiLevel::from_aqi(200), AqiLevel::Unhealthy);
        assert_eq!(AqiLevel::from_aqi(300), AqiLevel::VeryUnhealthy);
        assert_eq!(AqiLevel::from_aqi(301), AqiLevel::Hazardous);
        assert_eq!(AqiLevel::from_aqi(500), AqiLevel::Hazardous);
    }

    #[test]
    fn test_name_round_trip() {
        for level in [
            AqiLevel::Good,
            AqiLevel::Moderate,
            AqiLevel::UnhealthySensitive,
            AqiLevel::Unhealthy,
            AqiLevel::VeryUnhealthy,
            AqiLevel::Hazardous,
        ] {
            assert_eq!(level.as_str().parse::<AqiLevel>().unwrap(), level);
        }
        assert!("smoggy".parse::<AqiLevel>().is_err());
    }

    #[test]
    fn test_info_from_pm25() {
        let info = AqiInfo::from_pm25(40.0);
        assert_eq!(info.level, AqiLevel::UnhealthySensitive);
        assert_eq!(info.label, "Unhealthy for Sensitive Groups");
        assert!(info.value > 100 && info.value <= 150);
    }
}
