//! Data Validation
//!
//! Provides range checking for incoming air-quality readings and
//! per-sensor health classification.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{SensorHealth, SensorStatus, ValidationConfig, ValidationResult, Validator};
