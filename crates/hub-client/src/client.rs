use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ClientError;

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    pub timeout_secs: u64,
    /// Poll period for [`crate::ReadingsPoller`]
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5008".to_string(),
            timeout_secs: 10,
            poll_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Body of `GET /readings`; every field is absent when nothing is stored
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LatestReading {
    pub id: Option<i64>,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub co2: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub aqi_value: Option<i64>,
    pub timestamp: Option<String>,
    pub username: Option<String>,
}

impl LatestReading {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub city: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherSnapshot {
    pub city: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    pub id: i64,
    pub pm10: f64,
    pub pm25: f64,
    pub co2: f64,
    pub humidity: f64,
    pub temperature: f64,
    pub aqi_value: i64,
    pub aqi_level: String,
    pub location_name: Option<String>,
    pub timestamp: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// REST API client
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HubClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    /// Decode a success body or turn `{"error": ..}` into [`ClientError::Api`]
    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
        };
        debug!(status = status.as_u16(), "API error: {}", message);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Self::decode(resp).await
    }

    pub async fn latest_reading(&self) -> Result<LatestReading, ClientError> {
        let resp = self.http.get(self.url("/readings")).send().await?;
        Self::decode(resp).await
    }

    /// Log in and keep the token for authenticated calls
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, ClientError> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        let session: Session = Self::decode(resp).await?;
        self.token = Some(session.access_token.clone());
        Ok(session)
    }

    /// Register an account, returning the server's message
    pub async fn register(&self, form: &RegisterForm) -> Result<String, ClientError> {
        let resp = self.http.post(self.url("/register")).json(form).send().await?;
        let body: Value = Self::decode(resp).await?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }

    pub async fn weather(&self, city: &str) -> Result<WeatherSnapshot, ClientError> {
        let resp = self
            .http
            .get(self.url("/weather"))
            .query(&[("city", city)])
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn weather_at(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, ClientError> {
        let resp = self
            .http
            .get(self.url("/weather"))
            .query(&[("lat", lat), ("lon", lon)])
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Stored readings between two days, newest first
    pub async fn history(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: Option<u32>,
    ) -> Result<Vec<HistoryRow>, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(start) = start {
            query.push(("start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = end {
            query.push(("end", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let resp = self
            .http
            .get(self.url("/readings/history"))
            .query(&query)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Update the logged-in user's city
    pub async fn update_city(&self, city: &str) -> Result<String, ClientError> {
        let builder = self
            .http
            .post(self.url("/update-city"))
            .json(&serde_json::json!({ "city": city }));
        let resp = self.authed(builder)?.send().await?;
        let body: Value = Self::decode(resp).await?;
        Ok(body["city"].as_str().unwrap_or(city).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimmed() {
        let client = HubClient::new(&ClientConfig {
            base_url: "http://hub.local:5008/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url("/health"), "http://hub.local:5008/health");
    }

    #[test]
    fn test_empty_reading() {
        let reading: LatestReading = serde_json::from_str("{}").unwrap();
        assert!(reading.is_empty());

        let reading: LatestReading =
            serde_json::from_str(r#"{"id": 3, "pm25": 12.0, "aqi_level": "good"}"#).unwrap();
        assert!(!reading.is_empty());
        assert_eq!(reading.pm25, Some(12.0));
        assert_eq!(reading.co2, None);
    }

    #[tokio::test]
    async fn test_authenticated_call_needs_login() {
        let client = HubClient::new(&ClientConfig::default()).unwrap();
        let err = client.update_city("Pune").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
