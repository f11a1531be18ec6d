//! HTTP route handlers

pub mod alerts;
pub mod auth;
pub mod export;
pub mod insights;
pub mod readings;
pub mod weather;
