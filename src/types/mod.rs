//! Shared data structures for the aircraft telemetry pipeline
//!
//! This module defines the core types passed between pipeline stages:
//! - Stage 0: TelemetryReading (simulated sensor sample)
//! - Stage 1: ScreeningResult (threshold screener output)
//! - Stage 2: ConfirmationResult (outlier confirmer output)
//! - Stage 3: Diagnosis (root cause from the text generator)
//! - Stage 4: Resolution (maintenance recommendation)
//! - Recorded: PipelineCycleResult, blackboard StageRecord, RunSummary

mod telemetry;
mod stages;
mod pipeline;

pub use telemetry::*;
pub use stages::*;
pub use pipeline::*;
