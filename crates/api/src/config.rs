//! Server configuration
//!
//! Loaded from an optional TOML file layered under `AQI_*` environment
//! variables (`AQI_SERVER__ADDR=0.0.0.0:9000`).

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use sensor_sim::SimulatorConfig;
use serde::Deserialize;

use crate::rate_limit::RateLimitConfig;

/// Default file looked up when `AQI_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "aqi-hub.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub weather: WeatherConfig,
    pub simulator: SimulatorSection,
    pub sync: SyncConfig,
    pub alerts: AlertConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Allow any origin
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5008".to_string(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://aqi-hub.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expire_secs: u64,
    pub bcrypt_cost: u32,
    pub admin_username: String,
    /// Admin account is only seeded when set
    pub admin_password: Option<String>,
}

/// Placeholder secret, replaced in any real deployment
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_expire_secs: 86_400,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorSection {
    pub enabled: bool,
    pub tick_ms: u64,
    pub seed: Option<u64>,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        let defaults = SimulatorConfig::default();
        Self {
            enabled: true,
            tick_ms: defaults.tick_ms,
            seed: defaults.seed,
        }
    }
}

impl From<&SimulatorSection> for SimulatorConfig {
    fn from(section: &SimulatorSection) -> Self {
        SimulatorConfig {
            tick_ms: section.tick_ms,
            seed: section.seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `AQI_CONFIG`, or the default
    /// file) and the environment. Missing files are not an error.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = path
            .map(str::to_string)
            .or_else(|| std::env::var("AQI_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("AQI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
