//! Pipeline Regression Tests
//!
//! Runs the full orchestrator (real simulator, real trained isolation forest)
//! against a scripted text generator. Asserts on history ordering, snapshot
//! consistency, stale blackboard semantics after skipped cycles, generator
//! call counts and the run summary.

use airline_orchestrator::llm::{LlmError, TextGenerator};
use airline_orchestrator::types::{CycleOutcome, Diagnosis, Resolution, Severity, StageKey, StageRecord};
use airline_orchestrator::{PipelineConfig, PipelineOrchestrator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Answers diagnosis prompts and resolution prompts with fixed JSON and
/// counts every call.
#[derive(Default)]
struct CannedGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _system: &str, prompt: &str, _model: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("provide diagnosis") {
            Ok(r#"Diagnosis follows. {"root_cause": "Fuel nozzle coking", "severity": "high", "subsystem": "Engine"}"#.to_string())
        } else {
            Ok(r#"{"recommendation": "Borescope inspection of combustor", "priority": "high", "estimated_time": "4 hours", "required_resources": ["Borescope", "Powerplant technician"]}"#.to_string())
        }
    }

    fn backend_name(&self) -> &'static str {
        "canned"
    }
}

fn config(cycles: u32, anomaly_probability: f64, seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.orchestrator.num_cycles = cycles;
    config.orchestrator.anomaly_probability = anomaly_probability;
    config.orchestrator.cycle_interval_ms = 0;
    config.orchestrator.seed = Some(seed);
    config
}

async fn run(cycles: u32, p: f64, seed: u64) -> (PipelineOrchestrator, Arc<CannedGenerator>) {
    let generator = Arc::new(CannedGenerator::default());
    let mut orch = PipelineOrchestrator::new(&config(cycles, p, seed), generator.clone()).expect("detector trains");
    orch.run(&CancellationToken::new()).await.expect("run completes");
    (orch, generator)
}

#[tokio::test]
async fn history_has_one_entry_per_cycle_in_order() {
    let (orch, _) = run(3, 0.15, 1).await;
    let cycles: Vec<u64> = orch.history().iter().map(|r| r.cycle).collect();
    assert_eq!(cycles, vec![1, 2, 3]);
    for r in orch.history() {
        assert_eq!(r.telemetry.cycle, r.cycle);
        assert_eq!(r.telemetry_analysis.telemetry, r.telemetry);
        assert_eq!(r.anomaly_validation.telemetry, r.telemetry);
        assert_eq!(r.anomaly_validation.threshold_detected, r.telemetry_analysis.anomalies_detected);
    }
}

#[tokio::test]
async fn snapshots_never_reference_future_cycles() {
    let (orch, _) = run(12, 0.5, 2).await;
    for r in orch.history() {
        let snap = &r.shared_memory_snapshot;
        assert_eq!(snap["telemetry_analysis"].source_cycle(), Some(r.cycle));
        assert_eq!(snap["anomaly_validation"].source_cycle(), Some(r.cycle));
        for record in snap.values() {
            if let Some(c) = record.source_cycle() {
                assert!(c <= r.cycle);
            }
        }
    }
}

#[tokio::test]
async fn generator_called_twice_per_confirmed_cycle_only() {
    let (orch, generator) = run(20, 0.5, 3).await;
    let confirmed = orch.history().iter().filter(|r| r.is_confirmed()).count();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2 * confirmed);

    for r in orch.history() {
        if r.is_confirmed() {
            assert_eq!(r.outcome, CycleOutcome::Diagnosed);
            assert_eq!(r.diagnosis.root_cause, "Fuel nozzle coking");
            assert_eq!(r.diagnosis.severity, Some(Severity::High));
            assert_eq!(r.resolution.required_resources.len(), 2);
        } else {
            assert_eq!(r.outcome, CycleOutcome::Skipped);
            assert_eq!(r.diagnosis, Diagnosis::false_alarm());
            assert_eq!(r.resolution, Resolution::false_alarm());
        }
    }
}

#[tokio::test]
async fn skipped_cycles_keep_previous_diagnosis_on_blackboard() {
    let (orch, _) = run(25, 0.5, 4).await;
    let mut seen_confirmed = false;
    for r in orch.history() {
        seen_confirmed |= r.is_confirmed();
        let snap = &r.shared_memory_snapshot;
        // Diagnosis and resolution appear once any cycle has been confirmed and never disappear
        assert_eq!(snap.contains_key("diagnosis"), seen_confirmed, "cycle {}", r.cycle);
        assert_eq!(snap.contains_key("resolution"), seen_confirmed, "cycle {}", r.cycle);
        if !r.is_confirmed() && seen_confirmed {
            match &snap["diagnosis"] {
                StageRecord::Diagnosis(d) => assert_eq!(d.root_cause, "Fuel nozzle coking"),
                other => panic!("unexpected record {other:?}"),
            }
        }
    }
}

#[tokio::test]
async fn summary_matches_history() {
    let (orch, _) = run(10, 0.5, 5).await;
    let summary = orch.summary();
    let history = orch.history();

    assert_eq!(summary.total_cycles, 10);
    assert_eq!(summary.confirmed_anomalies + summary.false_alarms, 10);
    assert_eq!(
        summary.threshold_flags,
        history.iter().filter(|r| r.telemetry_analysis.anomalies_detected).count()
    );
    let breakdown_cycles: Vec<u64> = summary.breakdown.iter().map(|b| b.cycle).collect();
    let confirmed_cycles: Vec<u64> = history.iter().filter(|r| r.is_confirmed()).map(|r| r.cycle).collect();
    assert_eq!(breakdown_cycles, confirmed_cycles);
    assert!(summary.to_string().contains("Total Cycles Processed: 10"));
}

#[tokio::test]
async fn same_seed_reproduces_run() {
    let (a, _) = run(6, 0.4, 77).await;
    let (b, _) = run(6, 0.4, 77).await;
    for (x, y) in a.history().iter().zip(b.history()) {
        assert_eq!(x.telemetry.features(), y.telemetry.features());
        assert_eq!(x.telemetry.anomaly_type, y.telemetry.anomaly_type);
        assert_eq!(x.anomaly_validation.ml_confirmed, y.anomaly_validation.ml_confirmed);
        assert_eq!(x.anomaly_validation.ml_score, y.anomaly_validation.ml_score);
    }
}

#[tokio::test]
async fn blackboard_reset_between_runs_of_cycles() {
    let generator = Arc::new(CannedGenerator::default());
    let mut orch = PipelineOrchestrator::new(&config(2, 0.0, 6), generator).expect("detector trains");
    orch.run_cycle().await.expect("cycle");
    assert!(orch.blackboard().read(StageKey::TelemetryAnalysis).is_some());
    orch.reset_blackboard();
    assert!(orch.blackboard().is_empty());
    let next = orch.run_cycle().await.expect("cycle");
    assert_eq!(next.cycle, 2);
    assert!(next.shared_memory_snapshot.contains_key("telemetry_analysis"));
}
