//! AQI, insight and comparison routes

use aqi_core::{
    activity_recommendations, compare_locations, is_emergency, parameter_status, personal_risk,
    safety_score, AgeGroup, AirSample, AqiInfo, Comparison, HealthCondition, LocationReport,
    Parameter, ParameterStatus, PersonalRisk, Recommendation, SafetyScore,
};
use axum::{
    extract::State,
    Json,
};
use sensor_sim::random_location_sample;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, JsonBody, QueryParams};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct AqiQuery {
    pub pm25: f64,
}

/// AQI category for a PM2.5 concentration
pub async fn get_aqi(QueryParams(query): QueryParams<AqiQuery>) -> Json<AqiInfo> {
    Json(AqiInfo::from_pm25(query.pm25))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InsightsRequest {
    /// Sample to assess; the live simulator sample when omitted
    pub sample: Option<AirSample>,
    pub age_group: Option<AgeGroup>,
    pub health_condition: Option<HealthCondition>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub sample: AirSample,
    pub aqi: AqiInfo,
    pub safety: SafetyScore,
    pub risk_label: &'static str,
    pub parameters: Vec<ParameterStatus>,
    pub recommendations: Vec<Recommendation>,
    pub emergency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_risk: Option<PersonalRisk>,
}

/// Everything the dashboard derives from one sample
pub fn build_insights(sample: AirSample, request: &InsightsRequest) -> InsightsResponse {
    let aqi = AqiInfo::from_pm25(sample.pm25);
    let safety = safety_score(&sample);
    let personal = if request.age_group.is_some() || request.health_condition.is_some() {
        Some(personal_risk(
            aqi.value,
            request.age_group.unwrap_or_default(),
            request.health_condition.unwrap_or_default(),
        ))
    } else {
        None
    };

    InsightsResponse {
        parameters: Parameter::ALL
            .iter()
            .map(|p| parameter_status(p.value_of(&sample), *p))
            .collect(),
        recommendations: activity_recommendations(aqi.value),
        emergency: is_emergency(&sample),
        risk_label: safety.risk.label(),
        personal_risk: personal,
        safety,
        aqi,
        sample,
    }
}

pub async fn post_insights(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<InsightsRequest>,
) -> Json<InsightsResponse> {
    let sample = request.sample.unwrap_or_else(|| *state.live.borrow());
    Json(build_insights(sample, &request))
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub first: Option<String>,
    pub second: Option<String>,
    pub first_sample: Option<AirSample>,
    pub second_sample: Option<AirSample>,
}

/// Compare two locations; missing samples are simulated
pub async fn post_compare(JsonBody(request): JsonBody<CompareRequest>) -> ApiResult<Json<Comparison>> {
    let name = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let (Some(first), Some(second)) = (name(request.first), name(request.second)) else {
        return Err(ApiError::BadRequest("Please enter both locations".to_string()));
    };

    let mut rng = rand::thread_rng();
    let first_sample = request
        .first_sample
        .unwrap_or_else(|| random_location_sample(&mut rng));
    let second_sample = request
        .second_sample
        .unwrap_or_else(|| random_location_sample(&mut rng));

    Ok(Json(compare_locations(
        LocationReport::new(first, first_sample),
        LocationReport::new(second, second_sample),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi_core::{RiskBand, RiskLevel};

    #[test]
    fn test_insights_without_profile() {
        let sample = AirSample {
            pm10: 20.0,
            pm25: 5.0,
            co2: 420.0,
            humidity: 45.0,
            temperature: 22.0,
        };
        let insights = build_insights(sample, &InsightsRequest::default());
        assert_eq!(insights.safety.risk, RiskLevel::Excellent);
        assert_eq!(insights.parameters.len(), 5);
        assert!(insights.personal_risk.is_none());
        assert!(!insights.emergency);
    }

    #[test]
    fn test_insights_with_profile() {
        let sample = AirSample {
            pm25: 80.0,
            ..Default::default()
        };
        let request = InsightsRequest {
            age_group: Some(AgeGroup::Child),
            ..Default::default()
        };
        let risk = build_insights(sample, &request).personal_risk.unwrap();
        assert_eq!(risk.base_risk, RiskBand::Critical);
    }
}
