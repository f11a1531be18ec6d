//! Weather Route

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, QueryParams};
use crate::weather::{WeatherQuery, WeatherReport};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl WeatherParams {
    /// Coordinates win over a city name
    fn query(self) -> Option<WeatherQuery> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(self.lat), present(self.lon), present(self.city)) {
            (Some(lat), Some(lon), _) => Some(WeatherQuery::Coords { lat, lon }),
            (_, _, Some(city)) => Some(WeatherQuery::City(city)),
            _ => None,
        }
    }
}

/// Current weather for a city or coordinates
pub async fn get_weather(
    State(state): State<SharedState>,
    QueryParams(params): QueryParams<WeatherParams>,
) -> ApiResult<Json<WeatherReport>> {
    let query = params.query().ok_or_else(|| {
        ApiError::NotFound("City parameter or lat/lon coordinates are required".to_string())
    })?;

    metrics::counter!("aqi_weather_requests_total").increment(1);
    Ok(Json(state.weather.current(&query).await?))
}
