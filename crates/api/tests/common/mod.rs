#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use aqi_core::AirSample;
use api::config::AppConfig;
use api::{create_router, AppState, SharedState};
use axum::body::{to_bytes, Body};
use axum::extract::Query;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use sensor_sim::INITIAL_SAMPLE;
use serde_json::{json, Value};
use storage::Repository;
use tokio::sync::watch;
use tower::util::ServiceExt;

pub const WEATHER_KEY: &str = "test-key";

pub struct TestContext {
    pub state: SharedState,
    pub app: Router,
    pub live_tx: watch::Sender<AirSample>,
}

/// Fake OpenWeatherMap endpoint
async fn fake_weather(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("appid").map(String::as_str) != Some(WEATHER_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad key" })));
    }
    if params.get("units").map(String::as_str) != Some("metric") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "units" })));
    }
    match params.get("q").map(String::as_str) {
        Some("nowhere") => (StatusCode::NOT_FOUND, Json(json!({ "message": "city not found" }))),
        Some("broken") => (StatusCode::BAD_GATEWAY, Json(json!({}))),
        q => (
            StatusCode::OK,
            Json(json!({
                "name": q.unwrap_or("Coordinates"),
                "main": { "temp": 21.5, "humidity": 60 },
                "wind": { "speed": 3.2 }
            })),
        ),
    }
}

/// Start the fake weather server, returning its URL
pub async fn spawn_weather_server() -> String {
    let app = Router::new().route("/data/2.5/weather", get(fake_weather));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/data/2.5/weather", addr)
}

pub fn test_config(weather_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.weather.api_key = WEATHER_KEY.to_string();
    config.weather.base_url = weather_url;
    config.weather.timeout_secs = 5;
    config.simulator.enabled = false;
    config.sync.enabled = false;
    config.metrics.enabled = false;
    config
}

pub async fn build_test_context() -> TestContext {
    let weather_url = spawn_weather_server().await;
    build_test_context_with(test_config(weather_url)).await
}

pub async fn build_test_context_with(config: AppConfig) -> TestContext {
    let repository = Repository::in_memory().await.unwrap();
    let (live_tx, live_rx) = watch::channel(INITIAL_SAMPLE);
    let state: SharedState = Arc::new(AppState::new(config, repository, live_rx).unwrap());
    let app = create_router(state.clone());
    TestContext { state, app, live_tx }
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = request_raw(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn request_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

/// Register and log in, returning the access token
pub async fn register_and_login(app: &Router, username: &str) -> String {
    let (status, _) = request_json(
        app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": username, "password": "secret123", "email": format!("{}@example.com", username) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request_json(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

pub fn reading_body(pm25: f64) -> Value {
    json!({
        "pm10": 40.0,
        "pm25": pm25,
        "co2": 450.0,
        "humidity": 55.0,
        "temperature": 24.0
    })
}
