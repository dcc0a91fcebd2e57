//! Telemetry acquisition
//!
//! Synthetic engine telemetry with probabilistic anomaly injection.

pub mod simulator;

pub use simulator::{sample_normal_features, SensorBand, TelemetrySimulator};
