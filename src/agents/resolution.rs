//! Resolution Stage - maintenance recommendations from a diagnosis
//!
//! Same failure policy as the diagnosis stage: always returns a well-formed
//! `Resolution`, falling back to medium priority when the generator or its
//! reply is unusable.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::diagnosis::value_text;
use crate::llm::{extract_json_object, strip_think_tags, TextGenerator};
use crate::types::{Diagnosis, Priority, Resolution};

const SYSTEM_MESSAGE: &str = "You are a ResolutionAgent that creates maintenance action plans.
You receive diagnosis information and must generate:
1. Step-by-step maintenance recommendations
2. Priority level
3. Estimated time to resolution
4. Required resources/tools

Always respond in valid JSON format with clear action items.";

const NO_JSON: &str = "Unable to generate recommendation";
const INVALID_JSON: &str = "Unable to generate recommendation - invalid JSON";
const NO_RECOMMENDATION: &str = "No recommendation available";
const UNKNOWN: &str = "Unknown";

/// Characters of the recommendation shown in the progress log
const LOG_PREVIEW_CHARS: usize = 100;

pub struct ResolutionStage {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl std::fmt::Debug for ResolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionStage")
            .field("backend", &self.generator.backend_name())
            .field("model", &self.model)
            .finish()
    }
}

impl ResolutionStage {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Recommend maintenance for `diagnosis`. A diagnosis without severity is a
    /// false alarm and gets the placeholder without a generator call.
    pub async fn resolve(&self, diagnosis: &Diagnosis) -> Resolution {
        let Some(severity) = diagnosis.severity else {
            return Resolution::false_alarm();
        };

        let prompt = format!(
            "Based on this diagnosis, provide maintenance recommendations:

Diagnosis:
- Root Cause: {}
- Severity: {}
- Subsystem: {}

Provide a JSON response with:
1. recommendation: Detailed step-by-step maintenance actions
2. priority: One of [low, medium, high, urgent]
3. estimated_time: Estimated time to complete (e.g., \"2 hours\", \"next maintenance window\")
4. required_resources: List of required tools/parts/personnel

Respond ONLY with valid JSON, no additional text.
",
            diagnosis.root_cause,
            severity,
            diagnosis.subsystem.as_deref().unwrap_or(UNKNOWN)
        );

        let start = Instant::now();
        let resolution = match self.generator.generate(SYSTEM_MESSAGE, &prompt, &self.model).await {
            Ok(reply) => parse_reply(&reply),
            Err(e) => {
                warn!(error = %e, model = %self.model, "Resolution generation failed, using fallback");
                fallback(format!("Resolution error: {e}"))
            }
        };

        let preview: String = resolution.recommendation.chars().take(LOG_PREVIEW_CHARS).collect();
        info!(latency_ms = start.elapsed().as_millis() as u64, "Recommended Action: {preview}...");
        info!(
            "Priority: {} | Time: {}",
            resolution.priority.unwrap_or(Priority::Medium),
            resolution.estimated_time.as_deref().unwrap_or(UNKNOWN)
        );

        resolution
    }
}

fn fallback(recommendation: impl Into<String>) -> Resolution {
    Resolution {
        recommendation: recommendation.into(),
        priority: Some(Priority::Medium),
        estimated_time: Some(UNKNOWN.to_string()),
        required_resources: Vec::new(),
    }
}

fn parse_reply(reply: &str) -> Resolution {
    let text = strip_think_tags(reply);
    let Ok(json) = extract_json_object(&text).map_err(|e| {
        warn!(reason = ?e, "No JSON object in resolution reply");
    }) else {
        return fallback(NO_JSON);
    };

    let map: Map<String, Value> = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return fallback(INVALID_JSON),
        Err(e) => {
            warn!(error = %e, "JSON parse error in resolution reply");
            return fallback(INVALID_JSON);
        }
    };

    let priority = match map.get("priority") {
        None | Some(Value::Null) => Priority::Medium,
        Some(v) => value_text(v).parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "Unrecognized priority, using medium");
            Priority::Medium
        }),
    };

    Resolution {
        recommendation: map
            .get("recommendation")
            .map_or_else(|| NO_RECOMMENDATION.to_string(), recommendation_text),
        priority: Some(priority),
        estimated_time: Some(map.get("estimated_time").map_or_else(|| UNKNOWN.to_string(), value_text)),
        required_resources: map.get("required_resources").map(resource_list).unwrap_or_default(),
    }
}

/// A single string, or a list of steps joined one per line.
fn recommendation_text(v: &Value) -> String {
    match v {
        Value::Array(steps) => steps.iter().map(value_text).collect::<Vec<_>>().join("\n"),
        other => value_text(other),
    }
}

/// Resources arrive as a list or, from some models, a single string.
fn resource_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => vec![value_text(other)],
    }
}
