//! Reading ingest pipeline
//!
//! Validates a sample, stores it with its AQI, and writes alert logs for
//! every rule it trips outside the cooldown window. Used by `POST /readings`
//! and by the periodic simulator sync.

use aqi_core::{AirSample, AqiLevel};
use alerting::{AlertRule, AlertType};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storage::{now_ms, AlertLogRecord, SensorRecord};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::SharedState;

/// Optional location attached to a reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: Option<String>,
}

/// Result of ingesting one sample
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub reading: SensorRecord,
    pub alerts: Vec<AlertLogRecord>,
}

/// Run one sample through validation, storage and alert evaluation.
///
/// Readings with `created_by` are checked against that user's rules only;
/// station readings are checked against every enabled rule.
pub async fn ingest(
    state: &SharedState,
    sample: AirSample,
    location: Location,
    created_by: Option<i64>,
) -> Result<IngestOutcome, ApiError> {
    let validation = state.validator.validate_reading(&sample);
    if !validation.valid {
        return Err(ApiError::BadRequest(validation.summary()));
    }

    let aqi = sample.aqi();
    let now = now_ms();
    let reading = state
        .repository
        .insert_reading(SensorRecord {
            id: 0,
            pm10: sample.pm10,
            pm25: sample.pm25,
            co2: sample.co2,
            humidity: sample.humidity,
            temperature: sample.temperature,
            aqi_value: i64::from(aqi),
            aqi_level: AqiLevel::from_aqi(aqi).as_str().to_string(),
            location_lat: location.lat,
            location_lng: location.lng,
            location_name: location.name,
            created_by,
            recorded_at_ms: now,
        })
        .await?;

    metrics::counter!("aqi_readings_ingested_total").increment(1);
    metrics::histogram!("aqi_reading_aqi").record(f64::from(aqi));
    debug!(reading_id = reading.id, aqi, "Stored reading");

    let rules: Vec<AlertRule> = state
        .repository
        .enabled_alerts()
        .await?
        .into_iter()
        .filter(|a| created_by.map_or(true, |uid| a.user_id == uid))
        .filter_map(|a| match a.alert_type.parse::<AlertType>() {
            Ok(alert_type) => Some(AlertRule {
                user_id: a.user_id,
                alert_type,
                threshold: a.threshold_value,
            }),
            Err(e) => {
                warn!(alert_id = a.id, "Skipping rule: {}", e);
                None
            }
        })
        .collect();

    // Held across the writes so concurrent ingests cannot both pass the cooldown
    let mut manager = state.alert_manager.lock().await;
    let triggered = manager.triggered(&rules, &sample, aqi);
    let mut alerts = Vec::new();

    for hit in triggered {
        let persisted = state
            .repository
            .last_alert_log_ms(hit.user_id, hit.alert_type.as_str())
            .await?;
        if !manager.should_fire(hit.user_id, hit.alert_type, now, persisted) {
            continue;
        }

        let log = state
            .repository
            .insert_alert_log(AlertLogRecord {
                id: 0,
                user_id: hit.user_id,
                alert_type: hit.alert_type.as_str().to_string(),
                message: hit.message,
                is_read: false,
                sensor_reading_id: Some(reading.id),
                created_at_ms: now,
            })
            .await?;

        manager.record_fire(hit.user_id, hit.alert_type, now);
        metrics::counter!("aqi_alerts_fired_total", "type" => hit.alert_type.as_str()).increment(1);
        alerts.push(log);
    }

    Ok(IngestOutcome { reading, alerts })
}

/// Store the latest simulator sample every `interval`
pub async fn run_sync_loop(state: SharedState, live: watch::Receiver<AirSample>, interval: Duration) {
    info!("Starting reading sync every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let sample = *live.borrow();
        match ingest(&state, sample, Location::default(), None).await {
            Ok(outcome) => debug!(
                reading_id = outcome.reading.id,
                alerts = outcome.alerts.len(),
                "Synced simulator reading"
            ),
            Err(e) => error!(error = %e, "Failed to sync simulator reading"),
        }
    }
}
