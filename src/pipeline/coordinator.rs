//! Pipeline Orchestrator - four-stage cycle for aircraft telemetry
//!
//! ```text
//! STAGE 1: Telemetry reading + threshold screening (every cycle)
//! STAGE 2: Outlier confirmation (every cycle)
//! STAGE 3: LLM diagnosis (ONLY if confirmed)
//! STAGE 4: LLM resolution (ONLY if confirmed)
//! ```
//!
//! Stages run strictly one after another. Each stage publishes its result to
//! the blackboard as soon as it completes; skipped stages publish nothing, so
//! after a skipped cycle the `diagnosis` and `resolution` entries still hold
//! the last confirmed cycle's results.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::blackboard::Blackboard;
use super::state::CycleState;
use crate::acquisition::TelemetrySimulator;
use crate::agents::{DiagnosisStage, OutlierConfirmer, ResolutionStage, ThresholdScreener};
use crate::config::{ModelRole, PipelineConfig};
use crate::llm::TextGenerator;
use crate::ml_engine::{AnomalyDetector, DetectorError, OutlierModel};
use crate::types::{
    CycleOutcome, Diagnosis, PipelineCycleResult, Resolution, RunSummary, StageRecord,
};

const BANNER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Drives the simulator and the four stages for a fixed number of cycles
pub struct PipelineOrchestrator {
    simulator: TelemetrySimulator,
    screener: ThresholdScreener,
    confirmer: OutlierConfirmer,
    diagnosis: DiagnosisStage,
    resolution: ResolutionStage,
    blackboard: Blackboard,
    history: Vec<PipelineCycleResult>,
    num_cycles: u32,
    cycle_interval: Duration,
    interrupted: bool,
}

impl PipelineOrchestrator {
    /// Train the detector on its synthetic baseline and wire up all stages.
    pub fn new(config: &PipelineConfig, generator: Arc<dyn TextGenerator>) -> Result<Self, DetectorError> {
        let detector = AnomalyDetector::trained_from_config(&config.ml_model)?;
        Ok(Self::with_model(config, generator, Arc::new(detector)))
    }

    /// Wire up the stages around an already trained outlier model.
    pub fn with_model(
        config: &PipelineConfig,
        generator: Arc<dyn TextGenerator>,
        model: Arc<dyn OutlierModel>,
    ) -> Self {
        let orch = &config.orchestrator;
        let simulator = match orch.seed {
            Some(seed) => TelemetrySimulator::with_seed(orch.anomaly_probability, seed),
            None => TelemetrySimulator::new(orch.anomaly_probability),
        };

        Self {
            simulator,
            screener: ThresholdScreener::new(),
            confirmer: OutlierConfirmer::new(model),
            diagnosis: DiagnosisStage::new(generator.clone(), config.model_for(ModelRole::Diagnosis)),
            resolution: ResolutionStage::new(generator, config.model_for(ModelRole::Resolution)),
            blackboard: Blackboard::new(),
            history: Vec::new(),
            num_cycles: orch.num_cycles,
            cycle_interval: Duration::from_millis(orch.cycle_interval_ms),
            interrupted: false,
        }
    }

    /// Run all configured cycles, pacing between them.
    ///
    /// Cancellation is checked before each cycle and during the pacing wait;
    /// a cycle that has started always completes. A detector error aborts
    /// the run.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary, DetectorError> {
        info!("🚀 Starting telemetry pipeline: {} cycles", self.num_cycles);
        info!(
            interval_ms = self.cycle_interval.as_millis() as u64,
            anomaly_probability = self.simulator.anomaly_probability(),
            "Pipeline configuration"
        );

        for i in 0..self.num_cycles {
            if cancel.is_cancelled() {
                self.interrupted = true;
                break;
            }

            self.run_cycle().await?;

            if i + 1 < self.num_cycles {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Shutdown signal received, stopping after cycle {}", i + 1);
                        self.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.cycle_interval) => {}
                }
            }
        }

        let summary = self.summary();
        info!("{BANNER}");
        info!("📊 PIPELINE SUMMARY");
        info!("{BANNER}");
        for line in summary.to_string().lines() {
            info!("{line}");
        }
        Ok(summary)
    }

    /// Execute one full cycle and append it to history.
    pub async fn run_cycle(&mut self) -> Result<PipelineCycleResult, DetectorError> {
        let start = Instant::now();
        let mut state = CycleState::AwaitTelemetry;

        // Stage 1: reading + screening
        let reading = self.simulator.next_reading();
        info!("{BANNER}");
        info!("CYCLE {}", reading.cycle);
        info!("{BANNER}");
        info!(
            "Telemetry - RPM: {:.0} | Pressure: {:.0} PSI | Vibration: {:.2} mm/s | EGT: {:.0}°C",
            reading.rpm, reading.pressure, reading.vibration, reading.egt
        );
        if let Some(pattern) = reading.anomaly_type {
            debug!(cycle = reading.cycle, pattern = %pattern, "Injected anomaly pattern");
        }

        let screening = self.screener.screen(&reading);
        self.blackboard.write(StageRecord::TelemetryAnalysis(screening.clone()));
        state = state.advance(false);

        // Stage 2: confirmation
        let confirmation = self.confirmer.confirm(&screening)?;
        self.blackboard.write(StageRecord::AnomalyValidation(confirmation.clone()));
        state = state.advance(false);
        state = state.advance(confirmation.ml_confirmed);
        debug!(cycle = reading.cycle, state = %state, "Confirmation complete");

        // Stages 3-4 only for confirmed anomalies
        let (diagnosis, resolution, outcome) = if state == CycleState::Diagnosed {
            let diagnosis = self.diagnosis.diagnose(&confirmation).await;
            self.blackboard.write(StageRecord::Diagnosis(diagnosis.clone()));

            let resolution = self.resolution.resolve(&diagnosis).await;
            self.blackboard.write(StageRecord::Resolution(resolution.clone()));
            state = state.advance(true);

            (diagnosis, resolution, CycleOutcome::Diagnosed)
        } else {
            info!("No confirmed anomaly - skipping diagnosis and resolution");
            (Diagnosis::false_alarm(), Resolution::false_alarm(), CycleOutcome::Skipped)
        };

        state = state.advance(false);
        debug!(
            cycle = reading.cycle,
            state = %state,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Cycle recorded"
        );

        let result = PipelineCycleResult {
            cycle: reading.cycle,
            telemetry_analysis: screening,
            anomaly_validation: confirmation,
            diagnosis,
            resolution,
            outcome,
            shared_memory_snapshot: self.blackboard.snapshot(),
            telemetry: reading,
        };
        self.history.push(result.clone());
        Ok(result)
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Cycle results in execution order
    pub fn history(&self) -> &[PipelineCycleResult] {
        &self.history
    }

    pub fn reset_blackboard(&mut self) {
        self.blackboard.reset();
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_history(&self.history, self.interrupted)
    }

    pub fn num_cycles(&self) -> u32 {
        self.num_cycles
    }
}
