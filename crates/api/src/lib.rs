//! Air Quality Monitoring API Server
//!
//! REST API for the air-quality dashboard: readings, history and exports,
//! user accounts with JWT auth, alert rules with a live alert stream,
//! weather proxy and AQI insights.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use aqi_core::AirSample;
use alerting::AlertManager;
use data_validator::Validator;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sensor_sim::{DriftSimulator, SimulatorConfig, INITIAL_SAMPLE};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::Repository;
use tokio::sync::{watch, Mutex};
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod rate_limit;
mod routes;
pub mod sync;
pub mod weather;

use crate::config::{AppConfig, LoggingConfig, DEV_JWT_SECRET};
use crate::rate_limit::{create_governor_config, DefaultGovernorConfig, RateLimitConfig};
use crate::weather::WeatherClient;

/// Application state shared across handlers
pub struct AppState {
    pub config: AppConfig,
    /// Storage repository
    pub repository: Repository,
    pub validator: Validator,
    pub alert_manager: Mutex<AlertManager>,
    pub weather: WeatherClient,
    /// Latest simulator sample
    pub live: watch::Receiver<AirSample>,
    /// Prometheus handle, when the recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(
        config: AppConfig,
        repository: Repository,
        live: watch::Receiver<AirSample>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            weather: WeatherClient::new(&config.weather)?,
            alert_manager: Mutex::new(AlertManager::new(config.alerts.clone())),
            validator: Validator::default(),
            repository,
            live,
            metrics_handle: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            config,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub metrics: SystemMetrics,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub database: ComponentHealth,
    pub simulator: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

impl ComponentHealth {
    fn new(ok: bool) -> Self {
        Self {
            status: if ok { "ok" } else { "error" }.to_string(),
        }
    }
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub reading_count: i64,
    pub alert_log_count: i64,
}

/// Create the application router without rate limiting
pub fn create_router(state: SharedState) -> Router {
    build_router(state, None)
}

/// Create the application router with `/register` and `/login` limited per
/// peer IP. Serve it with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_rate_limited_router(state: SharedState, config: &RateLimitConfig) -> Router {
    let governor = create_governor_config(config);
    if governor.is_none() {
        warn!("Invalid rate limit config, credential endpoints are not limited");
    }
    build_router(state, governor)
}

fn build_router(state: SharedState, governor: Option<Arc<DefaultGovernorConfig>>) -> Router {
    let mut credentials: Router<SharedState> = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));
    if let Some(config) = governor {
        credentials = credentials.layer(GovernorLayer { config });
    }

    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/api-status", get(api_status_handler))
        .route("/metrics", get(metrics_handler))
        .route("/readings", get(routes::readings::get_latest))
        .route("/readings/live", get(routes::readings::get_live))
        .route("/readings/history", get(routes::readings::get_history))
        .route("/weather", get(routes::weather::get_weather))
        .route("/aqi", get(routes::insights::get_aqi))
        .route("/insights", post(routes::insights::post_insights))
        .route("/compare", post(routes::insights::post_compare))
        .route("/export/csv", get(routes::export::export_csv))
        .route("/export/report", get(routes::export::export_report))
        .merge(credentials);

    let protected = Router::new()
        .route("/update-city", post(routes::auth::update_city))
        .route("/readings", post(routes::readings::create_reading))
        .route("/dashboard-data", get(routes::readings::dashboard_data))
        .route(
            "/alerts",
            get(routes::alerts::list_alerts).post(routes::alerts::create_alert),
        )
        .route(
            "/alerts/:id",
            patch(routes::alerts::update_alert).delete(routes::alerts::delete_alert),
        )
        .route("/alerts/logs", get(routes::alerts::list_logs))
        .route("/alerts/logs/:id/read", post(routes::alerts::mark_log_read))
        .route("/alerts/stream", get(routes::alerts::stream_alerts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::jwt_auth_middleware,
        ));

    let mut app = public
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let database_ok = state.repository.ping().await.is_ok();
    let simulator_ok = state.live.has_changed().is_ok();

    let response = HealthResponse {
        ok: true,
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            database: ComponentHealth::new(database_ok),
            simulator: ComponentHealth::new(simulator_ok),
        },
        metrics: SystemMetrics {
            reading_count: state.repository.reading_count().await.unwrap_or(0),
            alert_log_count: state.repository.alert_log_count().await.unwrap_or(0),
        },
    };

    Json(response)
}

async fn api_status_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => error::ApiError::NotFound("Metrics are disabled".to_string()).into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level: {}", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the server until Ctrl-C
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set AQI_AUTH__JWT_SECRET");
    }

    let repository = Repository::connect(&config.database.url).await?;

    if let Some(password) = &config.auth.admin_password {
        let hash = auth::hash_password(password, config.auth.bcrypt_cost)?;
        let admin = repository.seed_admin(&config.auth.admin_username, &hash).await?;
        info!(user_id = admin.id, "Admin account ready");
    }

    let (live_tx, live_rx) = watch::channel(INITIAL_SAMPLE);
    if config.simulator.enabled {
        let simulator = DriftSimulator::new(SimulatorConfig::from(&config.simulator));
        tokio::spawn(simulator.run(live_tx));
    } else {
        // Receivers keep serving the initial sample
        drop(live_tx);
    }

    let mut state = AppState::new(config.clone(), repository, live_rx.clone())?;
    if config.metrics.enabled {
        state = state.with_metrics(install_metrics()?);
    }
    let state: SharedState = Arc::new(state);

    if config.sync.enabled {
        let interval = Duration::from_secs(config.sync.interval_secs.max(1));
        tokio::spawn(sync::run_sync_loop(state.clone(), live_rx, interval));
    }

    let app = create_rate_limited_router(state, &config.rate_limit);

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API server stopped");
    Ok(())
}
