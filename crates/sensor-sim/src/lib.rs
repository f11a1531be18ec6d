//! Air-Quality Sensor Simulator
//!
//! Produces a slowly drifting sample on a timer and random one-off samples
//! for locations that have no sensor.

mod simulator;

pub use simulator::{random_location_sample, DriftSimulator, SimulatorConfig, INITIAL_SAMPLE};
