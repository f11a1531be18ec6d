//! Readings poller
//!
//! Fetches `/readings` on a fixed period and publishes the merged sample on
//! a watch channel. A failed poll keeps the previous sample and marks the
//! poller disconnected until the next success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aqi_core::AirSample;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{HubClient, LatestReading};

/// Overlay the fields present in `latest` onto `previous`
pub fn merge_reading(previous: AirSample, latest: &LatestReading) -> AirSample {
    AirSample {
        pm10: latest.pm10.unwrap_or(previous.pm10),
        pm25: latest.pm25.unwrap_or(previous.pm25),
        co2: latest.co2.unwrap_or(previous.co2),
        humidity: latest.humidity.unwrap_or(previous.humidity),
        temperature: latest.temperature.unwrap_or(previous.temperature),
    }
}

pub struct ReadingsPoller {
    client: HubClient,
    period: Duration,
    tx: watch::Sender<AirSample>,
    connected: Arc<AtomicBool>,
}

impl ReadingsPoller {
    /// Create a poller seeded with `initial`, returning it with a receiver
    pub fn new(
        client: HubClient,
        period: Duration,
        initial: AirSample,
    ) -> (Self, watch::Receiver<AirSample>) {
        let (tx, rx) = watch::channel(initial);
        let poller = Self {
            client,
            period,
            tx,
            connected: Arc::new(AtomicBool::new(false)),
        };
        (poller, rx)
    }

    /// Shared connectivity flag, readable after the poller is spawned
    pub fn connection_flag(&self) -> Arc<AtomicBool> {
        self.connected.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn current(&self) -> AirSample {
        *self.tx.borrow()
    }

    /// Poll once; returns whether the API answered
    pub async fn poll_once(&self) -> bool {
        match self.client.latest_reading().await {
            Ok(latest) => {
                let merged = merge_reading(self.current(), &latest);
                self.tx.send_replace(merged);
                if !self.connected.swap(true, Ordering::Relaxed) {
                    info!("Connected to {}", self.client.base_url());
                }
                debug!(pm25 = merged.pm25, "Polled latest reading");
                true
            }
            Err(e) => {
                if self.connected.swap(false, Ordering::Relaxed) {
                    warn!("Lost connection to {}: {}", self.client.base_url(), e);
                }
                false
            }
        }
    }

    /// Poll until every receiver is dropped
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = self.tx.closed() => {
                    debug!("Readings poller stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    const PREVIOUS: AirSample = AirSample {
        pm10: 45.0,
        pm25: 32.0,
        co2: 450.0,
        humidity: 55.0,
        temperature: 24.0,
    };

    #[test]
    fn test_merge_keeps_missing_fields() {
        let latest = LatestReading {
            id: Some(1),
            pm25: Some(80.0),
            co2: Some(900.0),
            ..Default::default()
        };
        let merged = merge_reading(PREVIOUS, &latest);
        assert_eq!(merged.pm25, 80.0);
        assert_eq!(merged.co2, 900.0);
        assert_eq!(merged.pm10, 45.0);
        assert_eq!(merged.humidity, 55.0);
    }

    #[test]
    fn test_merge_empty_reading() {
        assert_eq!(merge_reading(PREVIOUS, &LatestReading::default()), PREVIOUS);
    }

    #[tokio::test]
    async fn test_unreachable_keeps_previous() {
        let client = HubClient::new(&ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();
        let (poller, rx) = ReadingsPoller::new(client, Duration::from_millis(10), PREVIOUS);

        assert!(!poller.poll_once().await);
        assert!(!poller.is_connected());
        assert_eq!(*rx.borrow(), PREVIOUS);
    }
}
