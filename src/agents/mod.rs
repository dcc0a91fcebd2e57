//! Pipeline stages for aircraft telemetry anomaly handling
//!
//! ## Stages (in cycle order)
//!
//! 1. **Threshold Screener**: fixed-limit rules, flags every out-of-range sensor
//! 2. **Outlier Confirmer**: isolation forest label, decides whether to continue
//! 3. **Diagnosis Stage**: LLM root cause, severity and subsystem
//! 4. **Resolution Stage**: LLM maintenance recommendation and priority
//!
//! Stages 3 and 4 run only for confirmed anomalies and never return errors.

pub mod telemetry;
pub mod anomaly;
pub mod diagnosis;
pub mod resolution;

#[cfg(test)]
pub(crate) mod testing;

pub use anomaly::{normalize_score, OutlierConfirmer};
pub use diagnosis::DiagnosisStage;
pub use resolution::ResolutionStage;
pub use telemetry::ThresholdScreener;
