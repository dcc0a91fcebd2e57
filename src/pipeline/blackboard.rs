//! Blackboard - latest result per stage
//!
//! Last-write-wins map from stage name to record. Owned by the orchestrator
//! and only touched between awaits on its task, so it needs no locking.

use crate::types::{BlackboardSnapshot, StageKey, StageRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    entries: BlackboardSnapshot,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `record` under its stage key, replacing any earlier entry.
    pub fn write(&mut self, record: StageRecord) {
        self.entries.insert(record.key().as_str().to_string(), record);
    }

    /// Latest entry for `key`, if any stage has published one.
    pub fn read(&self, key: StageKey) -> Option<&StageRecord> {
        self.entries.get(key.as_str())
    }

    /// Lookup by raw name; unknown names simply read as absent.
    pub fn read_named(&self, name: &str) -> Option<&StageRecord> {
        self.entries.get(name)
    }

    /// Deep copy of the current contents.
    pub fn snapshot(&self) -> BlackboardSnapshot {
        self.entries.clone()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Diagnosis, ScreeningResult, Severity, TelemetryReading};

    fn screening(cycle: u64) -> StageRecord {
        StageRecord::TelemetryAnalysis(ScreeningResult {
            anomalies_detected: false,
            anomaly_details: Vec::new(),
            telemetry: TelemetryReading::new(cycle, 9000.0, 1900.0, 0.4, 750.0),
        })
    }

    #[test]
    fn test_empty_reads_absent() {
        let bb = Blackboard::new();
        assert!(bb.is_empty());
        assert!(bb.read(StageKey::Diagnosis).is_none());
        assert!(bb.read_named("no_such_stage").is_none());
    }

    #[test]
    fn test_write_overwrites_same_key() {
        let mut bb = Blackboard::new();
        bb.write(screening(1));
        bb.write(screening(2));
        assert_eq!(bb.len(), 1);
        let latest = bb.read(StageKey::TelemetryAnalysis).expect("written");
        assert_eq!(latest.source_cycle(), Some(2));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut bb = Blackboard::new();
        bb.write(screening(1));
        let snap = bb.snapshot();
        bb.write(StageRecord::Diagnosis(Diagnosis {
            root_cause: "seal".into(),
            severity: Some(Severity::High),
            subsystem: Some("Hydraulic".into()),
        }));
        bb.write(screening(2));

        assert_eq!(snap.len(), 1);
        assert_eq!(snap["telemetry_analysis"].source_cycle(), Some(1));
        assert_eq!(bb.len(), 2);
    }

    #[test]
    fn test_reset_clears() {
        let mut bb = Blackboard::new();
        bb.write(screening(1));
        bb.reset();
        assert!(bb.is_empty());
        assert!(bb.read_named("telemetry_analysis").is_none());
    }
}
