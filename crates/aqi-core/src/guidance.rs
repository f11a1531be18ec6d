//! Guidance Derived from a Sample
//!
//! Parameter status, overall safety score, emergency detection,
//! activity recommendations and personalized health risk.

use crate::{calculate_aqi, AirSample, Parameter};
use serde::{Deserialize, Serialize};

/// Status band of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLevel {
    Good,
    Moderate,
    Poor,
}

/// Status of a single parameter against its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterStatus {
    pub parameter: Parameter,
    pub value: f64,
    pub safe: bool,
    pub level: ParameterLevel,
}

/// (good, moderate) upper bounds per parameter
fn thresholds(parameter: Parameter) -> (f64, f64) {
    match parameter {
        Parameter::Pm10 => (50.0, 100.0),
        Parameter::Pm25 => (25.0, 60.0),
        Parameter::Co2 => (800.0, 1000.0),
        Parameter::Humidity => (60.0, 70.0),
        Parameter::Temperature => (30.0, 35.0),
    }
}

/// Classify a parameter value
pub fn parameter_status(value: f64, parameter: Parameter) -> ParameterStatus {
    let (good, moderate) = thresholds(parameter);
    let (safe, level) = if value <= good {
        (true, ParameterLevel::Good)
    } else if value <= moderate {
        (true, ParameterLevel::Moderate)
    } else {
        (false, ParameterLevel::Poor)
    };

    ParameterStatus {
        parameter,
        value,
        safe,
        level,
    }
}

/// Overall risk band of a safety score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Excellent,
    Good,
    ModerateRisk,
    HighRisk,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Excellent,
            60..=79 => RiskLevel::Good,
            40..=59 => RiskLevel::ModerateRisk,
            _ => RiskLevel::HighRisk,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Excellent => "Excellent",
            RiskLevel::Good => "Good",
            RiskLevel::ModerateRisk => "Moderate Risk",
            RiskLevel::HighRisk => "High Risk",
        }
    }
}

/// Safety score (0-100) with its risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyScore {
    pub score: u8,
    pub risk: RiskLevel,
}

/// Compute the 0-100 safety score of a sample
pub fn safety_score(sample: &AirSample) -> SafetyScore {
    let aqi = calculate_aqi(sample.pm25);
    let mut score: i32 = 100;

    score -= match aqi {
        301.. => 50,
        201..=300 => 40,
        151..=200 => 30,
        101..=150 => 20,
        51..=100 => 10,
        _ => 0,
    };

    if sample.pm25 > 150.0 {
        score -= 20;
    } else if sample.pm25 > 100.0 {
        score -= 15;
    } else if sample.pm25 > 50.0 {
        score -= 10;
    }

    if sample.co2 > 2000.0 {
        score -= 15;
    } else if sample.co2 > 1000.0 {
        score -= 10;
    } else if sample.co2 > 800.0 {
        score -= 5;
    }

    if sample.temperature > 35.0 || sample.temperature < 10.0 {
        score -= 10;
    }
    if sample.humidity > 70.0 || sample.humidity < 30.0 {
        score -= 5;
    }

    let score = score.clamp(0, 100) as u8;
    SafetyScore {
        score,
        risk: RiskLevel::from_score(score),
    }
}

/// Whether conditions warrant an emergency banner
pub fn is_emergency(sample: &AirSample) -> bool {
    calculate_aqi(sample.pm25) > 200 || sample.pm25 > 150.0 || sample.co2 > 2000.0
}

/// One activity recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub safe: bool,
}

impl Recommendation {
    fn new(text: &str, safe: bool) -> Self {
        Self {
            text: text.to_string(),
            safe,
        }
    }
}

/// Activity recommendations for an AQI value
pub fn activity_recommendations(aqi: u32) -> Vec<Recommendation> {
    match aqi {
        0..=50 => vec![
            Recommendation::new("Perfect for outdoor activities", true),
            Recommendation::new("Great for outdoor exercise", true),
            Recommendation::new("Enjoy fresh air activities", true),
        ],
        51..=100 => vec![
            Recommendation::new("Moderate outdoor exercise is fine", true),
            Recommendation::new("Limit prolonged outdoor activities", false),
            Recommendation::new("Consider indoor alternatives for sensitive groups", false),
        ],
        101..=150 => vec![
            Recommendation::new("Stay indoors as much as possible", false),
            Recommendation::new("Avoid strenuous outdoor activities", false),
            Recommendation::new("Keep windows closed", false),
        ],
        _ => vec![
            Recommendation::new("Stay indoors and use air purifiers", false),
            Recommendation::new("Avoid all outdoor activities", false),
            Recommendation::new("Wear N95 mask if going outside", false),
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    #[default]
    Adult,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    #[default]
    None,
    Asthma,
    Heart,
    Both,
}

/// Severity band used by the personalized risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Critical,
}

/// Personalized health risk for a person profile at an AQI value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRisk {
    pub base_risk: RiskBand,
    pub personalized_risk: RiskBand,
    pub multiplier: f64,
    pub recommendations: Vec<String>,
}

/// Compute the personalized risk
pub fn personal_risk(aqi: u32, age: AgeGroup, condition: HealthCondition) -> PersonalRisk {
    let mut multiplier = 1.0;

    multiplier += match age {
        AgeGroup::Child => 0.3,
        AgeGroup::Adult => 0.0,
        AgeGroup::Senior => 0.4,
    };

    multiplier += match condition {
        HealthCondition::None => 0.0,
        HealthCondition::Asthma => 0.5,
        HealthCondition::Heart => 0.4,
        HealthCondition::Both => 0.8,
    };

    let base_risk = match aqi {
        151.. => {
            multiplier += 1.0;
            RiskBand::Critical
        }
        101..=150 => {
            multiplier += 0.5;
            RiskBand::High
        }
        51..=100 => {
            multiplier += 0.2;
            RiskBand::Moderate
        }
        _ => RiskBand::Low,
    };

    let personalized_risk = if multiplier > 2.0 {
        RiskBand::Critical
    } else if multiplier > 1.5 {
        RiskBand::High
    } else if multiplier > 1.0 {
        RiskBand::Moderate
    } else {
        RiskBand::Low
    };

    PersonalRisk {
        base_risk,
        personalized_risk,
        multiplier,
        recommendations: risk_recommendations(personalized_risk)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn risk_recommendations(band: RiskBand) -> &'static [&'static str] {
    match band {
        RiskBand::Critical => &[
            "Stay indoors with windows closed",
            "Wear N95 mask if going outside is necessary",
            "Keep rescue medications readily available",
            "Monitor symptoms closely and contact doctor if needed",
        ],
        RiskBand::High => &[
            "Limit outdoor activities, especially exercise",
            "Consider wearing a mask outdoors",
            "Use air purifiers indoors",
            "Plan outdoor activities during times with better AQI",
        ],
        RiskBand::Moderate => &[
            "Reduce prolonged outdoor exertion",
            "Watch for symptoms if you have respiratory issues",
            "Light outdoor activities are generally acceptable",
        ],
        RiskBand::Low => &[
            "Normal outdoor activities are safe",
            "Good day for exercise outdoors",
            "Enjoy the fresh air!",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_air() -> AirSample {
        AirSample {
            pm10: 20.0,
            pm25: 5.0,
            co2: 420.0,
            humidity: 45.0,
            temperature: 22.0,
        }
    }

    #[test]
    fn test_parameter_status_bands() {
        let s = parameter_status(25.0, Parameter::Pm25);
        assert!(s.safe);
        assert_eq!(s.level, ParameterLevel::Good);

        let s = parameter_status(900.0, Parameter::Co2);
        assert!(s.safe);
        assert_eq!(s.level, ParameterLevel::Moderate);

        let s = parameter_status(36.0, Parameter::Temperature);
        assert!(!s.safe);
        assert_eq!(s.level, ParameterLevel::Poor);
    }

    #[test]
    fn test_safety_score_clean_air() {
        let score = safety_score(&clean_air());
        assert_eq!(score.score, 100);
        assert_eq!(score.risk, RiskLevel::Excellent);
    }

    #[test]
    fn test_safety_score_penalties_stack() {
        let sample = AirSample {
            pm10: 200.0,
            pm25: 160.0, // AQI 210: -40, pm25 > 150: -20
            co2: 2100.0, // -15
            humidity: 80.0,    // -5
            temperature: 38.0, // -10
        };
        let score = safety_score(&sample);
        assert_eq!(score.score, 10);
        assert_eq!(score.risk, RiskLevel::HighRisk);
    }

    #[test]
    fn test_safety_score_never_negative() {
        let sample = AirSample {
            pm10: 999.0,
            pm25: 999.0,
            co2: 9999.0,
            humidity: 100.0,
            temperature: 60.0,
        };
        assert_eq!(safety_score(&sample).score, 0);
    }

    #[test]
    fn test_emergency_detection() {
        assert!(!is_emergency(&clean_air()));
        assert!(is_emergency(&AirSample { co2: 2500.0, ..clean_air() }));
        assert!(is_emergency(&AirSample { pm25: 151.0, ..clean_air() }));
    }

    #[test]
    fn test_recommendation_bands() {
        assert!(activity_recommendations(40).iter().all(|r| r.safe));
        assert_eq!(activity_recommendations(90).iter().filter(|r| r.safe).count(), 1);
        assert_eq!(activity_recommendations(320)[2].text, "Wear N95 mask if going outside");
    }

    #[test]
    fn test_personal_risk() {
        let risk = personal_risk(30, AgeGroup::Adult, HealthCondition::None);
        assert_eq!(risk.base_risk, RiskBand::Low);
        assert_eq!(risk.personalized_risk, RiskBand::Low);

        // 1 + 0.4 + 0.5 + 0.2 = 2.1
        let risk = personal_risk(80, AgeGroup::Senior, HealthCondition::Asthma);
        assert_eq!(risk.base_risk, RiskBand::Moderate);
        assert_eq!(risk.personalized_risk, RiskBand::Critical);
        assert_eq!(risk.recommendations.len(), 4);

        // 1 + 0.5 = 1.5, not above 1.5
        let risk = personal_risk(120, AgeGroup::Adult, HealthCondition::None);
        assert_eq!(risk.base_risk, RiskBand::High);
        assert_eq!(risk.personalized_risk, RiskBand::Moderate);
    }
}
