//! OpenWeatherMap proxy client

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::error::ApiError;

/// Location to look up
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coords { lat: String, lon: String },
}

/// Reduced weather report returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwmResponse {
    name: Option<String>,
    #[serde(default)]
    main: OwmMain,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Debug, Default, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// Fetch current conditions in metric units
    pub async fn current(&self, query: &WeatherQuery) -> Result<WeatherReport, ApiError> {
        if self.api_key.is_empty() {
            warn!("Weather API key is not configured");
            return Err(ApiError::Upstream("Invalid API key".to_string()));
        }

        let mut params = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        let fallback_city = match query {
            WeatherQuery::Coords { lat, lon } => {
                params.push(("lat", lat.clone()));
                params.push(("lon", lon.clone()));
                None
            }
            WeatherQuery::City(city) => {
                params.push(("q", city.clone()));
                Some(city.clone())
            }
        };

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Upstream("Weather API timeout".to_string())
                } else {
                    ApiError::Upstream(format!("Weather API request failed: {}", e))
                }
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound("City not found".to_string())),
            StatusCode::UNAUTHORIZED => return Err(ApiError::Upstream("Invalid API key".to_string())),
            status => {
                debug!(%status, "Weather API returned an error");
                return Err(ApiError::Upstream("Weather API error".to_string()));
            }
        }

        let body: OwmResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Weather API request failed: {}", e)))?;

        Ok(WeatherReport {
            city: body.name.or(fallback_city),
            temperature: body.main.temp,
            humidity: body.main.humidity,
            wind: body.wind.speed,
        })
    }
}
