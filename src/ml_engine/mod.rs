//! ML Engine - statistical outlier detection for telemetry confirmation
//!
//! ## Components
//!
//! - `isolation_forest`: Isolation Forest with contamination-derived offset (statrs quantile)
//! - `detector`: `AnomalyDetector`, trained once on a seeded synthetic baseline
//!
//! ## Contract
//!
//! `OutlierModel::detect(features) -> (is_anomaly, raw_score)`. The raw score
//! follows the isolation forest convention (lower = more anomalous);
//! normalisation to a non-negative anomalousness scale is done by the
//! confirmer in `agents::anomaly`.

pub mod isolation_forest;
pub mod detector;

pub use detector::AnomalyDetector;
pub use isolation_forest::{FeatureVector, ForestParams, IsolationForest};

/// Detector errors. `NotTrained` is a fatal pipeline error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    #[error("Anomaly detector not trained: train() must run before the first cycle")]
    NotTrained,

    #[error("Insufficient training data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Contamination {0} outside (0, 0.5]")]
    InvalidContamination(f64),

    #[error("Forest needs at least one estimator")]
    NoEstimators,
}

/// Black-box outlier classifier used by the confirmer
pub trait OutlierModel: Send + Sync {
    /// Classify one feature vector, returning `(is_anomaly, raw_score)`.
    fn detect(&self, features: &FeatureVector) -> Result<(bool, f64), DetectorError>;

    fn is_trained(&self) -> bool;
}
