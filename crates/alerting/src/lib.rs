//! Alerting System
//!
//! Provides alert types, threshold evaluation with user-facing messages,
//! and per-user cooldown deduplication.

mod manager;
mod rule;

pub use manager::{AlertConfig, AlertManager, AlertState};
pub use rule::{evaluate, AlertRule, AlertType, ParseAlertTypeError, TriggeredAlert};
