//! Hub Client
//!
//! Typed HTTP access to the air-quality REST API plus a poller that keeps
//! a dashboard's view of the latest reading current.

mod client;
mod poller;

pub use client::{
    ClientConfig, HealthStatus, HistoryRow, HubClient, LatestReading, RegisterForm, Session,
    SessionUser, WeatherSnapshot,
};
pub use poller::{merge_reading, ReadingsPoller};

use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not logged in")]
    NotAuthenticated,
}
