//! Threshold Screener - first-pass anomaly flagging
//!
//! Stateless rule evaluation against fixed engine limits. Every reading is
//! screened; the result is advisory only and never decides whether the
//! diagnosis stage runs (that is the confirmer's job).

use tracing::{info, warn};

use crate::types::{ScreeningResult, TelemetryReading};

// ============================================================================
// Screening Thresholds
// ============================================================================

/// Alert limits. RPM alerts on the normal band edges; the other sensors have
/// margin beyond their normal band before alerting.
pub mod screening_thresholds {
    /// Lowest RPM considered in range (inclusive)
    pub const RPM_MIN: f64 = 8500.0;
    /// Highest RPM considered in range (inclusive)
    pub const RPM_MAX: f64 = 9500.0;
    /// Pressure below this is a drop (PSI)
    pub const PRESSURE_DROP: f64 = 1500.0;
    /// Pressure above this is a spike (PSI)
    pub const PRESSURE_SPIKE: f64 = 2100.0;
    /// Vibration above this is high (mm/s)
    pub const VIBRATION_MAX: f64 = 1.0;
    /// EGT above this is a jump (°C)
    pub const EGT_MAX: f64 = 900.0;
}

use screening_thresholds as limits;

/// Rule-based screener over a single reading
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdScreener;

impl ThresholdScreener {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the four rules in fixed order: rpm, pressure, vibration, egt.
    pub fn screen(&self, reading: &TelemetryReading) -> ScreeningResult {
        let anomaly_details = violations(reading);

        if anomaly_details.is_empty() {
            info!(cycle = reading.cycle, "All parameters within normal thresholds");
        } else {
            warn!(
                cycle = reading.cycle,
                "Threshold anomaly detected: {}",
                anomaly_details.join(", ")
            );
        }

        ScreeningResult {
            anomalies_detected: !anomaly_details.is_empty(),
            anomaly_details,
            telemetry: reading.clone(),
        }
    }
}

fn violations(r: &TelemetryReading) -> Vec<String> {
    let mut details = Vec::new();

    if r.rpm < limits::RPM_MIN || r.rpm > limits::RPM_MAX {
        details.push(format!("RPM out of range: {:.0} rpm", r.rpm));
    }

    if r.pressure < limits::PRESSURE_DROP {
        details.push(format!("Pressure drop detected: {:.0} PSI", r.pressure));
    } else if r.pressure > limits::PRESSURE_SPIKE {
        details.push(format!("Pressure spike detected: {:.0} PSI", r.pressure));
    }

    if r.vibration > limits::VIBRATION_MAX {
        details.push(format!("High vibration detected: {:.2} mm/s", r.vibration));
    }

    if r.egt > limits::EGT_MAX {
        details.push(format!("EGT temperature jump: {:.0}°C", r.egt));
    }

    details
}
