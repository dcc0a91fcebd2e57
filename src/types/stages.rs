//! Per-stage outputs: screening, confirmation, diagnosis, resolution

use serde::{Deserialize, Serialize};

use super::{Severity, TelemetryReading};

/// Root cause recorded when the confirmer rejects a threshold flag
pub const FALSE_ALARM_DIAGNOSIS: &str = "No diagnosis needed - false alarm";
/// Recommendation recorded when there is nothing to resolve
pub const FALSE_ALARM_RECOMMENDATION: &str = "No action required - false alarm";

// ============================================================================
// Stage 1: Threshold Screening
// ============================================================================

/// Output of the threshold screener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreeningResult {
    pub anomalies_detected: bool,
    /// One human-readable message per violated rule, in rule order
    pub anomaly_details: Vec<String>,
    pub telemetry: TelemetryReading,
}

// ============================================================================
// Stage 2: Outlier Confirmation
// ============================================================================

/// Output of the outlier confirmer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationResult {
    /// Detector label; the only input to the skip decision
    pub ml_confirmed: bool,
    /// Anomalousness, >= 0, higher is more anomalous. Informational.
    pub ml_score: f64,
    /// Whether the screener flagged this reading
    pub threshold_detected: bool,
    pub telemetry: TelemetryReading,
}

// ============================================================================
// Stage 3: Diagnosis
// ============================================================================

/// Root-cause diagnosis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub root_cause: String,
    /// `None` iff the cycle short-circuited on a false alarm
    pub severity: Option<Severity>,
    pub subsystem: Option<String>,
}

impl Diagnosis {
    /// Placeholder used when the diagnosis stage is skipped
    pub fn false_alarm() -> Self {
        Self {
            root_cause: FALSE_ALARM_DIAGNOSIS.to_string(),
            severity: None,
            subsystem: None,
        }
    }

    pub fn is_false_alarm(&self) -> bool {
        self.severity.is_none()
    }
}

// ============================================================================
// Stage 4: Resolution
// ============================================================================

/// Maintenance priority requested from the resolution stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Maintenance recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resolution {
    pub recommendation: String,
    pub priority: Option<Priority>,
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub required_resources: Vec<String>,
}

impl Resolution {
    /// Placeholder used when the resolution stage is skipped
    pub fn false_alarm() -> Self {
        Self {
            recommendation: FALSE_ALARM_RECOMMENDATION.to_string(),
            priority: None,
            estimated_time: None,
            required_resources: Vec::new(),
        }
    }
}
