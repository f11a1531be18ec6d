//! Drift Simulator Implementation

use aqi_core::AirSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Configuration for the drift simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Interval between samples in milliseconds (default: 3000)
    pub tick_ms: u64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 3000,
            seed: None,
        }
    }
}

/// Starting point of every simulation
pub const INITIAL_SAMPLE: AirSample = AirSample {
    pm10: 45.0,
    pm25: 32.0,
    co2: 450.0,
    humidity: 55.0,
    temperature: 24.0,
};

/// Random-walk sensor simulator
pub struct DriftSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    current: AirSample,
}

impl DriftSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!("Drift simulator created (tick {} ms)", config.tick_ms);
        Self {
            config,
            rng,
            current: INITIAL_SAMPLE,
        }
    }

    /// Current sample without advancing
    pub fn current(&self) -> AirSample {
        self.current
    }

    /// Advance one tick and return the new sample
    pub fn step(&mut self) -> AirSample {
        let prev = self.current;
        let rng = &mut self.rng;

        self.current = AirSample {
            pm10: (prev.pm10 + rng.gen_range(-5.0..=5.0)).max(0.0),
            pm25: (prev.pm25 + rng.gen_range(-4.0..=4.0)).max(0.0),
            co2: (prev.co2 + rng.gen_range(-25.0..=25.0)).max(400.0),
            humidity: (prev.humidity + rng.gen_range(-2.5..=2.5)).clamp(0.0, 100.0),
            temperature: (prev.temperature + rng.gen_range(-1.5..=1.5)).clamp(0.0, 50.0),
        };
        self.current
    }

    /// Publish a new sample every tick until every receiver is gone
    pub async fn run(mut self, tx: watch::Sender<AirSample>) {
        info!("Starting drift simulator");
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.tick_ms.max(1)));
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sample = self.step();
                    debug!(pm25 = sample.pm25, co2 = sample.co2, "Simulated sample");
                    if tx.send(sample).is_err() {
                        break;
                    }
                }
                _ = tx.closed() => break,
            }
        }

        info!("Drift simulator stopped");
    }
}

impl Default for DriftSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

/// One random sample for an unmonitored location
pub fn random_location_sample<R: Rng + ?Sized>(rng: &mut R) -> AirSample {
    AirSample {
        pm10: rng.gen_range(0.0..150.0),
        pm25: rng.gen_range(0.0..100.0),
        co2: rng.gen_range(400.0..1200.0),
        humidity: rng.gen_range(40.0..80.0),
        temperature: rng.gen_range(20.0..45.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> DriftSimulator {
        DriftSimulator::new(SimulatorConfig {
            tick_ms: 10,
            seed: Some(seed),
        })
    }

    #[test]
    fn test_starts_at_initial_sample() {
        assert_eq!(DriftSimulator::default().current(), INITIAL_SAMPLE);
    }

    #[test]
    fn test_step_bounds_and_clamps() {
        let mut sim = seeded(42);
        for _ in 0..5000 {
            let prev = sim.current();
            let next = sim.step();
            assert!((next.pm10 - prev.pm10).abs() <= 5.0 + 1e-9);
            assert!((next.pm25 - prev.pm25).abs() <= 4.0 + 1e-9);
            assert!((next.co2 - prev.co2).abs() <= 25.0 + 1e-9);
            assert!(next.pm10 >= 0.0 && next.pm25 >= 0.0);
            assert!(next.co2 >= 400.0);
            assert!((0.0..=100.0).contains(&next.humidity));
            assert!((0.0..=50.0).contains(&next.temperature));
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let mut a = seeded(7);
        let mut b = seeded(7);
        for _ in 0..10 {
            assert_eq!(a.step(), b.step());
        }
    }

    #[test]
    fn test_random_location_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let s = random_location_sample(&mut rng);
            assert!((0.0..150.0).contains(&s.pm10));
            assert!((0.0..100.0).contains(&s.pm25));
            assert!((400.0..1200.0).contains(&s.co2));
            assert!((40.0..80.0).contains(&s.humidity));
            assert!((20.0..45.0).contains(&s.temperature));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_publishes_and_stops() {
        let (tx, mut rx) = watch::channel(INITIAL_SAMPLE);
        let handle = tokio::spawn(seeded(3).run(tx));

        rx.changed().await.unwrap();
        let first = *rx.borrow_and_update();
        assert_ne!(first, INITIAL_SAMPLE);

        drop(rx);
        handle.await.unwrap();
    }
}
