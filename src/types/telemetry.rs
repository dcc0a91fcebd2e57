//! Telemetry readings and the anomaly vocabulary attached to them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Injected anomaly pattern carried by a simulated reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Hydraulic pressure falls well below the operating band
    PressureDrop,
    /// Engine vibration rises to 2-4x normal
    VibrationSpike,
    /// Exhaust gas temperature jumps past the redline
    EgtJump,
}

impl AnomalyType {
    /// All patterns, in injection-table order
    pub const ALL: [Self; 3] = [Self::PressureDrop, Self::VibrationSpike, Self::EgtJump];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::PressureDrop => "pressure_drop",
            AnomalyType::VibrationSpike => "vibration_spike",
            AnomalyType::EgtJump => "egt_jump",
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity scale shared by injected anomalies and diagnoses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// One synthetic sensor sample
///
/// Created once per cycle by the telemetry simulator and never mutated
/// afterwards; every downstream stage receives its own clone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryReading {
    /// Engine speed (rpm)
    pub rpm: f64,
    /// Hydraulic pressure (PSI)
    pub pressure: f64,
    /// Engine vibration (mm/s)
    pub vibration: f64,
    /// Exhaust gas temperature (°C)
    pub egt: f64,
    /// Injected pattern, `None` for normal readings
    pub anomaly_type: Option<AnomalyType>,
    /// Severity of the injected pattern
    pub anomaly_severity: Option<Severity>,
    pub timestamp: DateTime<Utc>,
    /// Monotonic cycle counter, starts at 1
    pub cycle: u64,
}

impl TelemetryReading {
    /// Build a reading with no injected anomaly, stamped now.
    pub fn new(cycle: u64, rpm: f64, pressure: f64, vibration: f64, egt: f64) -> Self {
        Self {
            rpm,
            pressure,
            vibration,
            egt,
            anomaly_type: None,
            anomaly_severity: None,
            timestamp: Utc::now(),
            cycle,
        }
    }

    /// Feature vector in detector order: [rpm, pressure, vibration, egt]
    pub fn features(&self) -> [f64; 4] {
        [self.rpm, self.pressure, self.vibration, self.egt]
    }

    pub fn is_injected_anomaly(&self) -> bool {
        self.anomaly_type.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" critical ".parse::<Severity>(), Ok(Severity::Critical));
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_anomaly_type_serializes_snake_case() {
        let json = serde_json::to_string(&AnomalyType::VibrationSpike).expect("serialize");
        assert_eq!(json, "\"vibration_spike\"");
    }

    #[test]
    fn test_features_order() {
        let r = TelemetryReading::new(1, 9000.0, 1900.0, 0.4, 750.0);
        assert_eq!(r.features(), [9000.0, 1900.0, 0.4, 750.0]);
        assert!(!r.is_injected_anomaly());
    }
}
