//! Reading Routes

use aqi_core::{is_emergency, AirSample, AqiInfo};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use data_validator::SensorHealth;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::{now_ms, AlertLogRecord, SensorRecord};

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult, JsonBody, QueryParams};
use crate::export::format_timestamp;
use crate::sync::{ingest, Location};
use crate::SharedState;

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;
const DASHBOARD_LIMIT: i64 = 10;

/// Stored reading with a formatted timestamp
#[derive(Debug, Serialize)]
pub struct ReadingView {
    #[serde(flatten)]
    pub record: SensorRecord,
    pub timestamp: String,
    /// Author of a user-posted reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<SensorRecord> for ReadingView {
    fn from(record: SensorRecord) -> Self {
        Self {
            timestamp: format_timestamp(record.recorded_at_ms),
            username: None,
            record,
        }
    }
}

/// Query parameters for history and exports
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// First day, inclusive (`YYYY-MM-DD`)
    pub start: Option<NaiveDate>,
    /// Last day, inclusive (`YYYY-MM-DD`)
    pub end: Option<NaiveDate>,
    pub limit: Option<i64>,
}

fn utc_ms(dt: Option<NaiveDateTime>) -> Option<i64> {
    dt.map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis())
}

impl HistoryQuery {
    /// (start_ms, end_ms, limit); `end` covers the whole day
    pub fn bounds(&self) -> (Option<i64>, Option<i64>, i64) {
        let start = utc_ms(self.start.and_then(|d| d.and_hms_opt(0, 0, 0)));
        let end = utc_ms(self.end.and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)));
        let limit = self
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        (start, end, limit)
    }
}

/// Run a history query against the repository
pub(crate) async fn load_history(state: &SharedState, query: &HistoryQuery) -> ApiResult<Vec<SensorRecord>> {
    let (start, end, limit) = query.bounds();
    Ok(state.repository.readings_between(start, end, limit).await?)
}

/// Get the latest stored reading, `{}` when there is none
pub async fn get_latest(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    let latest = state.repository.latest_reading().await?;
    let Some(record) = latest else {
        return Ok(Json(Value::Object(Default::default())));
    };

    let username = match record.created_by {
        Some(user_id) => state
            .repository
            .find_user_by_id(user_id)
            .await?
            .map(|u| u.username),
        None => None,
    };
    let view = ReadingView {
        username,
        ..ReadingView::from(record)
    };
    let body = serde_json::to_value(view).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct ReadingInput {
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub co2: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedReading {
    pub reading: ReadingView,
    pub alerts: Vec<AlertLogRecord>,
}

/// Store a reading on behalf of the caller
pub async fn create_reading(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    JsonBody(input): JsonBody<ReadingInput>,
) -> ApiResult<(StatusCode, Json<CreatedReading>)> {
    let (Some(pm10), Some(pm25), Some(co2), Some(humidity), Some(temperature)) =
        (input.pm10, input.pm25, input.co2, input.humidity, input.temperature)
    else {
        return Err(ApiError::BadRequest(
            "pm10, pm25, co2, humidity and temperature are required".to_string(),
        ));
    };

    let sample = AirSample {
        pm10,
        pm25,
        co2,
        humidity,
        temperature,
    };
    let location = Location {
        lat: input.location_lat,
        lng: input.location_lng,
        name: input.location_name,
    };

    let outcome = ingest(&state, sample, location, Some(claims.user_id()?)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedReading {
            reading: outcome.reading.into(),
            alerts: outcome.alerts,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub sample: AirSample,
    pub aqi: AqiInfo,
    pub sensors: Vec<SensorHealth>,
    pub emergency: bool,
    pub timestamp_ms: i64,
}

/// Current simulator sample
pub async fn get_live(State(state): State<SharedState>) -> Json<LiveResponse> {
    let sample = *state.live.borrow();
    Json(LiveResponse {
        aqi: AqiInfo::from_pm25(sample.pm25),
        sensors: state.validator.sensor_health(&sample),
        emergency: is_emergency(&sample),
        timestamp_ms: now_ms(),
        sample,
    })
}

/// Readings in a date range, newest first
pub async fn get_history(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> ApiResult<Json<Vec<ReadingView>>> {
    let readings = load_history(&state, &query).await?;
    Ok(Json(readings.into_iter().map(ReadingView::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct DashboardPoint {
    pub id: i64,
    pub pm25: f64,
    pub humidity: f64,
    pub timestamp: String,
}

/// Last readings for the dashboard chart
pub async fn dashboard_data(State(state): State<SharedState>) -> ApiResult<Json<Vec<DashboardPoint>>> {
    let readings = state.repository.recent_readings(DASHBOARD_LIMIT).await?;
    Ok(Json(
        readings
            .into_iter()
            .map(|r| DashboardPoint {
                id: r.id,
                pm25: r.pm25,
                humidity: r.humidity,
                timestamp: format_timestamp(r.recorded_at_ms),
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_bounds_cover_end_day() {
        let query = HistoryQuery {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 1, 1),
            limit: None,
        };
        let (start, end, limit) = query.bounds();
        assert_eq!(start, Some(1_704_067_200_000));
        assert_eq!(end, Some(1_704_067_200_000 + 86_400_000 - 1));
        assert_eq!(limit, 100);
    }

    #[test]
    fn test_history_limit_clamped() {
        let query = HistoryQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(query.bounds(), (None, None, 1000));
    }
}
