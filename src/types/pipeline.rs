//! Pipeline-level records: blackboard entries, cycle results, run summary

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    ConfirmationResult, Diagnosis, Priority, Resolution, ScreeningResult, Severity,
    TelemetryReading,
};

/// Stage keys under which results are published on the blackboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    TelemetryAnalysis,
    AnomalyValidation,
    Diagnosis,
    Resolution,
}

impl StageKey {
    pub const ALL: [Self; 4] = [
        Self::TelemetryAnalysis,
        Self::AnomalyValidation,
        Self::Diagnosis,
        Self::Resolution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::TelemetryAnalysis => "telemetry_analysis",
            StageKey::AnomalyValidation => "anomaly_validation",
            StageKey::Diagnosis => "diagnosis",
            StageKey::Resolution => "resolution",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for StageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage result as stored on the blackboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stage", content = "result", rename_all = "snake_case")]
pub enum StageRecord {
    TelemetryAnalysis(ScreeningResult),
    AnomalyValidation(ConfirmationResult),
    Diagnosis(Diagnosis),
    Resolution(Resolution),
}

impl StageRecord {
    /// The key this record is published under
    pub fn key(&self) -> StageKey {
        match self {
            StageRecord::TelemetryAnalysis(_) => StageKey::TelemetryAnalysis,
            StageRecord::AnomalyValidation(_) => StageKey::AnomalyValidation,
            StageRecord::Diagnosis(_) => StageKey::Diagnosis,
            StageRecord::Resolution(_) => StageKey::Resolution,
        }
    }

    /// Cycle of the telemetry this record was derived from, when it carries one
    pub fn source_cycle(&self) -> Option<u64> {
        match self {
            StageRecord::TelemetryAnalysis(s) => Some(s.telemetry.cycle),
            StageRecord::AnomalyValidation(c) => Some(c.telemetry.cycle),
            StageRecord::Diagnosis(_) | StageRecord::Resolution(_) => None,
        }
    }
}

/// Owned copy of the blackboard contents at one point in time
pub type BlackboardSnapshot = BTreeMap<String, StageRecord>;

/// Which branch a cycle took after confirmation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Confirmed anomaly, diagnosis and resolution ran
    Diagnosed,
    /// False alarm or normal reading, stages 3-4 skipped
    Skipped,
}

/// Everything one pipeline cycle produced
///
/// Appended to the orchestrator history and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineCycleResult {
    pub cycle: u64,
    pub telemetry: TelemetryReading,
    pub telemetry_analysis: ScreeningResult,
    pub anomaly_validation: ConfirmationResult,
    pub diagnosis: Diagnosis,
    pub resolution: Resolution,
    pub outcome: CycleOutcome,
    pub shared_memory_snapshot: BlackboardSnapshot,
}

impl PipelineCycleResult {
    pub fn is_confirmed(&self) -> bool {
        self.anomaly_validation.ml_confirmed
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// Per-cycle line of the confirmed-anomaly breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyBreakdown {
    pub cycle: u64,
    pub root_cause: String,
    pub severity: Option<Severity>,
    pub subsystem: Option<String>,
    pub priority: Option<Priority>,
}

/// Cumulative summary over a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_cycles: usize,
    pub confirmed_anomalies: usize,
    pub false_alarms: usize,
    /// Cycles the threshold screener flagged, confirmed or not
    pub threshold_flags: usize,
    /// Run stopped early on user interrupt
    pub interrupted: bool,
    pub breakdown: Vec<AnomalyBreakdown>,
}

impl RunSummary {
    pub fn from_history(history: &[PipelineCycleResult], interrupted: bool) -> Self {
        let breakdown: Vec<AnomalyBreakdown> = history
            .iter()
            .filter(|r| r.is_confirmed())
            .map(|r| AnomalyBreakdown {
                cycle: r.cycle,
                root_cause: r.diagnosis.root_cause.clone(),
                severity: r.diagnosis.severity,
                subsystem: r.diagnosis.subsystem.clone(),
                priority: r.resolution.priority,
            })
            .collect();

        let confirmed_anomalies = breakdown.len();
        Self {
            total_cycles: history.len(),
            confirmed_anomalies,
            false_alarms: history.len() - confirmed_anomalies,
            threshold_flags: history
                .iter()
                .filter(|r| r.telemetry_analysis.anomalies_detected)
                .count(),
            interrupted,
            breakdown,
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total Cycles Processed: {}", self.total_cycles)?;
        writeln!(f, "Threshold Flags:        {}", self.threshold_flags)?;
        writeln!(f, "Anomalies Detected:     {}", self.confirmed_anomalies)?;
        writeln!(f, "False Alarms:           {}", self.false_alarms)?;
        if self.interrupted {
            writeln!(f, "Run interrupted before completing all cycles")?;
        }
        if !self.breakdown.is_empty() {
            writeln!(f, "Anomaly Breakdown:")?;
            for entry in &self.breakdown {
                let severity = entry.severity.map_or("unknown", |s| s.as_str());
                writeln!(f, "  Cycle {}: {} ({})", entry.cycle, entry.root_cause, severity)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_key_names_round_trip() {
        for key in StageKey::ALL {
            assert_eq!(StageKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(StageKey::from_name("monitoring"), None);
    }

    #[test]
    fn test_summary_of_empty_history() {
        let summary = RunSummary::from_history(&[], false);
        assert_eq!(summary.total_cycles, 0);
        assert_eq!(summary.confirmed_anomalies, 0);
        assert!(summary.breakdown.is_empty());
        assert!(summary.to_string().contains("Total Cycles Processed: 0"));
    }
}
