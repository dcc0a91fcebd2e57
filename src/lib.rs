//! Airline Orchestrator: Aircraft Telemetry Anomaly Pipeline
//!
//! Synthetic engine telemetry flows through four stages per cycle:
//!
//! - **Threshold Screener**: fixed-limit rules over RPM, pressure, vibration, EGT
//! - **Outlier Confirmer**: isolation forest trained on a seeded normal baseline
//! - **Diagnosis Stage**: LLM root cause for confirmed anomalies
//! - **Resolution Stage**: LLM maintenance recommendation
//!
//! The orchestrator publishes each stage's result to a blackboard, records a
//! snapshot per cycle and reports a summary at the end of the run.

pub mod config;
pub mod types;
pub mod acquisition;
pub mod agents;
pub mod ml_engine;
pub mod llm;
pub mod pipeline;

// Re-export configuration
pub use config::{ConfigError, PipelineConfig};

// Re-export commonly used types
pub use types::{
    AnomalyType, ConfirmationResult, CycleOutcome, Diagnosis, PipelineCycleResult, Priority,
    Resolution, RunSummary, ScreeningResult, Severity, StageKey, StageRecord, TelemetryReading,
};

// Re-export stages and pipeline
pub use acquisition::TelemetrySimulator;
pub use agents::{DiagnosisStage, OutlierConfirmer, ResolutionStage, ThresholdScreener};
pub use llm::{LlmError, OpenAiClient, TextGenerator};
pub use ml_engine::{AnomalyDetector, DetectorError, OutlierModel};
pub use pipeline::{Blackboard, CycleState, PipelineOrchestrator};
