//! Alert Manager Implementation

use crate::rule::{evaluate, AlertRule, AlertType, TriggeredAlert};
use aqi_core::AirSample;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Cooldown between two alerts of the same type for one user (seconds)
    pub cooldown_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 3600, // 1 hour
        }
    }
}

/// State of an alert for one (user, type) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    /// Last time this alert was fired (Unix ms)
    pub last_fired_ms: i64,
    /// Number of times fired since startup
    pub fire_count: usize,
}

/// Alert manager for threshold evaluation and deduplication
pub struct AlertManager {
    config: AlertConfig,
    states: HashMap<(i64, AlertType), AlertState>,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            states: HashMap::new(),
        }
    }

    fn cooldown_ms(&self) -> i64 {
        i64::try_from(self.config.cooldown_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    /// Check if an alert may fire at `now_ms`.
    ///
    /// A fire exactly one cooldown ago still suppresses.
    /// `persisted_last_ms` is the newest stored log for the pair, so the
    /// cooldown survives restarts.
    pub fn should_fire(
        &self,
        user_id: i64,
        alert_type: AlertType,
        now_ms: i64,
        persisted_last_ms: Option<i64>,
    ) -> bool {
        let remembered = self.states.get(&(user_id, alert_type)).map(|s| s.last_fired_ms);
        let last = match (remembered, persisted_last_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        match last {
            Some(last) if now_ms.saturating_sub(last) <= self.cooldown_ms() => {
                debug!(user_id, alert_type = %alert_type, "Alert suppressed: in cooldown period");
                false
            }
            _ => true,
        }
    }

    /// Record that an alert was fired
    pub fn record_fire(&mut self, user_id: i64, alert_type: AlertType, now_ms: i64) {
        let state = self
            .states
            .entry((user_id, alert_type))
            .or_insert(AlertState {
                last_fired_ms: now_ms,
                fire_count: 0,
            });

        state.last_fired_ms = now_ms;
        state.fire_count += 1;

        info!(user_id, alert_type = %alert_type, count = state.fire_count, "Alert recorded");
    }

    /// Evaluate rules against a sample, without applying the cooldown
    pub fn triggered(&self, rules: &[AlertRule], sample: &AirSample, aqi: u32) -> Vec<TriggeredAlert> {
        rules
            .iter()
            .filter_map(|rule| {
                evaluate(rule.alert_type, rule.threshold, sample, aqi).map(|message| TriggeredAlert {
                    user_id: rule.user_id,
                    alert_type: rule.alert_type,
                    message,
                })
            })
            .collect()
    }

    /// Get the in-memory state of a pair
    pub fn state(&self, user_id: i64, alert_type: AlertType) -> Option<&AlertState> {
        self.states.get(&(user_id, alert_type))
    }

    /// Clear all alert states
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn test_deduplication() {
        let mut manager = AlertManager::default();

        assert!(manager.should_fire(1, AlertType::Pm25High, 0, None));
        manager.record_fire(1, AlertType::Pm25High, 0);

        // Same pair inside the window is suppressed
        assert!(!manager.should_fire(1, AlertType::Pm25High, HOUR_MS - 1, None));
        // Other type and other user are independent
        assert!(manager.should_fire(1, AlertType::Co2High, 10, None));
        assert!(manager.should_fire(2, AlertType::Pm25High, 10, None));
        // Boundary is inclusive
        assert!(!manager.should_fire(1, AlertType::Pm25High, HOUR_MS, None));
        assert!(manager.should_fire(1, AlertType::Pm25High, HOUR_MS + 1, None));
    }

    #[test]
    fn test_persisted_timestamp_counts() {
        let manager = AlertManager::default();
        assert!(!manager.should_fire(7, AlertType::AqiWarning, 5_000, Some(1_000)));
        assert!(manager.should_fire(7, AlertType::AqiWarning, HOUR_MS + 1_001, Some(1_000)));
    }

    #[test]
    fn test_short_cooldown() {
        let mut manager = AlertManager::new(AlertConfig { cooldown_secs: 60 });
        manager.record_fire(1, AlertType::HumidityHigh, 0);
        assert!(!manager.should_fire(1, AlertType::HumidityHigh, 60_000, None));
        assert!(manager.should_fire(1, AlertType::HumidityHigh, 60_001, None));
        assert_eq!(manager.state(1, AlertType::HumidityHigh).unwrap().fire_count, 1);
    }

    #[test]
    fn test_triggered_batch() {
        let manager = AlertManager::default();
        let sample = AirSample {
            pm10: 80.0,
            pm25: 40.0,
            co2: 900.0,
            humidity: 50.0,
            temperature: 25.0,
        };
        let rules = vec![
            AlertRule { user_id: 1, alert_type: AlertType::Pm25High, threshold: 35.0 },
            AlertRule { user_id: 1, alert_type: AlertType::Co2High, threshold: 1000.0 },
            AlertRule { user_id: 2, alert_type: AlertType::AqiWarning, threshold: 100.0 },
        ];

        let fired = manager.triggered(&rules, &sample, sample.aqi());
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].alert_type, AlertType::Pm25High);
        assert_eq!(fired[1].user_id, 2);
        assert!(fired[1].message.starts_with("AQI (112)"));
    }
}
