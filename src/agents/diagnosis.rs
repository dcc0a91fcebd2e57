//! Diagnosis Stage - LLM root-cause analysis of confirmed anomalies
//!
//! Runs only when the confirmer agreed the reading is anomalous. The stage
//! never fails: generator errors and unusable replies degrade to a
//! medium-severity diagnosis naming what went wrong.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::llm::{extract_json_object, strip_think_tags, TextGenerator};
use crate::types::{ConfirmationResult, Diagnosis, Severity};

const SYSTEM_MESSAGE: &str = "You are a DiagnosisAgent specializing in aircraft system root cause analysis.
You receive confirmed anomaly data and must identify:
1. Root cause of the anomaly
2. Severity level (low, medium, high, critical)
3. Affected subsystem (engine, hydraulic, electrical, etc.)

Provide clear, concise diagnosis based on the telemetry patterns.";

const NO_JSON: &str = "Unable to parse diagnosis";
const INVALID_JSON: &str = "Unable to parse diagnosis - invalid JSON";
const UNKNOWN: &str = "Unknown";

pub struct DiagnosisStage {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl std::fmt::Debug for DiagnosisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosisStage")
            .field("backend", &self.generator.backend_name())
            .field("model", &self.model)
            .finish()
    }
}

impl DiagnosisStage {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Diagnose a confirmed anomaly, or return the false-alarm placeholder
    /// without calling the generator.
    pub async fn diagnose(&self, confirmation: &ConfirmationResult) -> Diagnosis {
        if !confirmation.ml_confirmed {
            return Diagnosis::false_alarm();
        }

        let prompt = build_prompt(confirmation);
        let start = Instant::now();

        let diagnosis = match self.generator.generate(SYSTEM_MESSAGE, &prompt, &self.model).await {
            Ok(reply) => parse_reply(&reply),
            Err(e) => {
                warn!(error = %e, model = %self.model, "Diagnosis generation failed, using fallback");
                fallback(format!("Diagnosis error: {e}"))
            }
        };

        info!(
            cycle = confirmation.telemetry.cycle,
            latency_ms = start.elapsed().as_millis() as u64,
            "Root cause: {}",
            diagnosis.root_cause
        );
        info!(
            "Severity: {} | Subsystem: {}",
            diagnosis.severity.unwrap_or(Severity::Medium),
            diagnosis.subsystem.as_deref().unwrap_or(UNKNOWN)
        );

        diagnosis
    }
}

fn build_prompt(confirmation: &ConfirmationResult) -> String {
    let t = &confirmation.telemetry;
    format!(
        "Analyze this aircraft telemetry anomaly and provide diagnosis:

Telemetry Data:
- RPM: {:.0} rpm
- Pressure: {:.0} PSI
- Vibration: {:.2} mm/s
- EGT: {:.0}°C
- ML Anomaly Score: {:.2}

Provide a JSON response with:
1. root_cause: Brief description of the likely root cause
2. severity: One of [low, medium, high, critical]
3. subsystem: Affected subsystem (e.g., \"Engine\", \"Hydraulic System\", \"Electrical\")

Respond ONLY with valid JSON, no additional text.
",
        t.rpm, t.pressure, t.vibration, t.egt, confirmation.ml_score
    )
}

fn fallback(root_cause: impl Into<String>) -> Diagnosis {
    Diagnosis {
        root_cause: root_cause.into(),
        severity: Some(Severity::Medium),
        subsystem: Some(UNKNOWN.to_string()),
    }
}

/// Turn a raw reply into a diagnosis, defaulting anything missing.
fn parse_reply(reply: &str) -> Diagnosis {
    let text = strip_think_tags(reply);
    let Ok(json) = extract_json_object(&text).map_err(|e| {
        warn!(reason = ?e, "No JSON object in diagnosis reply");
    }) else {
        return fallback(NO_JSON);
    };

    let map = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return fallback(INVALID_JSON),
        Err(e) => {
            warn!(error = %e, "JSON parse error in diagnosis reply");
            return fallback(INVALID_JSON);
        }
    };

    let severity = match map.get("severity") {
        None | Some(Value::Null) => Severity::Medium,
        Some(v) => value_text(v).parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "Unrecognized severity, using medium");
            Severity::Medium
        }),
    };

    Diagnosis {
        root_cause: map.get("root_cause").map_or_else(|| UNKNOWN.to_string(), value_text),
        severity: Some(severity),
        subsystem: Some(map.get("subsystem").map_or_else(|| UNKNOWN.to_string(), value_text)),
    }
}

/// String values as-is, anything else in its JSON form.
pub(crate) fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedGenerator;
    use crate::types::TelemetryReading;

    fn confirmation(ml_confirmed: bool) -> ConfirmationResult {
        ConfirmationResult {
            ml_confirmed,
            ml_score: 0.61,
            threshold_detected: true,
            telemetry: TelemetryReading::new(4, 9120.0, 950.0, 0.42, 760.0),
        }
    }

    fn stage(generator: &Arc<ScriptedGenerator>) -> DiagnosisStage {
        DiagnosisStage::new(generator.clone(), "gpt-4-turbo")
    }

    #[tokio::test]
    async fn test_false_alarm_skips_generator() {
        let generator = Arc::new(ScriptedGenerator::replying(&[r#"{"root_cause": "x"}"#]));
        let d = stage(&generator).diagnose(&confirmation(false)).await;
        assert_eq!(d, Diagnosis::false_alarm());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_parses_wrapped_json_reply() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            "Here you go:\n{\"root_cause\": \"Hydraulic seal leak\", \"severity\": \"high\", \"subsystem\": \"Hydraulic System\"}\nThanks",
        ]));
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert_eq!(d.root_cause, "Hydraulic seal leak");
        assert_eq!(d.severity, Some(Severity::High));
        assert_eq!(d.subsystem.as_deref(), Some("Hydraulic System"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_embeds_telemetry_and_model() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{}"]));
        stage(&generator).diagnose(&confirmation(true)).await;
        let (system, prompt, model) = generator.last_request().expect("one call");
        assert!(system.contains("DiagnosisAgent"));
        assert!(prompt.contains("RPM: 9120 rpm"));
        assert!(prompt.contains("Pressure: 950 PSI"));
        assert!(prompt.contains("Vibration: 0.42 mm/s"));
        assert!(prompt.contains("EGT: 760°C"));
        assert!(prompt.contains("ML Anomaly Score: 0.61"));
        assert_eq!(model, "gpt-4-turbo");
    }

    #[tokio::test]
    async fn test_missing_keys_take_defaults() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{}"]));
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert_eq!(d.root_cause, "Unknown");
        assert_eq!(d.severity, Some(Severity::Medium));
        assert_eq!(d.subsystem.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn test_unknown_severity_maps_to_medium() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"root_cause": "r", "severity": "catastrophic", "subsystem": "Engine"}"#,
        ]));
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert_eq!(d.severity, Some(Severity::Medium));
        assert_eq!(d.subsystem.as_deref(), Some("Engine"));
    }

    #[tokio::test]
    async fn test_reply_without_json_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying(&["I think it is the pump."]));
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert_eq!(d.root_cause, "Unable to parse diagnosis");
        assert_eq!(d.severity, Some(Severity::Medium));
        assert_eq!(d.subsystem.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back() {
        let generator = Arc::new(ScriptedGenerator::replying(&[r#"{"root_cause": pump}"#]));
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert_eq!(d.root_cause, "Unable to parse diagnosis - invalid JSON");
        assert_eq!(d.severity, Some(Severity::Medium));
    }

    #[tokio::test]
    async fn test_generator_error_falls_back() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let d = stage(&generator).diagnose(&confirmation(true)).await;
        assert!(d.root_cause.starts_with("Diagnosis error: "), "{}", d.root_cause);
        assert_eq!(d.severity, Some(Severity::Medium));
        assert_eq!(d.subsystem.as_deref(), Some("Unknown"));
    }
}
