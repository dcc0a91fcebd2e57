//! Config validation: unknown-key detection with Levenshtein suggestions
//! and value range checks.
//!
//! Two-pass parse approach: first deserialize the raw file into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::PipelineConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for PipelineConfig.
///
/// Any new field added to PipelineConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "openai_api_key",
        // [openai]
        "openai",
        "openai.base_url",
        "openai.timeout_secs",
        "openai.temperature",
        // [models]
        "models",
        "models.diagnosis",
        "models.resolution",
        "models.monitoring",
        // [orchestrator]
        "orchestrator",
        "orchestrator.num_cycles",
        "orchestrator.anomaly_probability",
        "orchestrator.cycle_interval_ms",
        "orchestrator.seed",
        // [ml_model]
        "ml_model",
        "ml_model.n_samples",
        "ml_model.contamination",
        "ml_model.n_estimators",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

/// Convert a JSON config document into the TOML value tree.
///
/// JSON `null` has no TOML counterpart; null members are dropped so they
/// fall back to their serde defaults.
pub fn json_to_toml(raw_json: &str) -> Result<toml::Value, String> {
    let mut json: serde_json::Value = serde_json::from_str(raw_json).map_err(|e| e.to_string())?;
    strip_nulls(&mut json);
    toml::Value::try_from(json).map_err(|e| e.to_string())
}

fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so the suggestion is
/// stable across runs.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Return warnings for any unknown config keys in a parsed document.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(value: &toml::Value) -> Vec<ValidationWarning> {
    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key,
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed PipelineConfig.
///
/// Every returned string is an impossible value that must prevent startup.
pub fn validate_ranges(config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let o = &config.orchestrator;
    let ml = &config.ml_model;

    if o.num_cycles == 0 {
        errors.push("orchestrator.num_cycles must be >= 1".to_string());
    }
    if !(0.0..=1.0).contains(&o.anomaly_probability) {
        errors.push(format!(
            "orchestrator.anomaly_probability = {:.3} must be within [0, 1]",
            o.anomaly_probability
        ));
    }

    if ml.n_samples < 2 {
        errors.push(format!(
            "ml_model.n_samples = {} must be >= 2 to build a tree",
            ml.n_samples
        ));
    }
    if !(ml.contamination > 0.0 && ml.contamination <= 0.5) {
        errors.push(format!(
            "ml_model.contamination = {:.3} must be within (0, 0.5]",
            ml.contamination
        ));
    }
    if ml.n_estimators == 0 {
        errors.push("ml_model.n_estimators must be >= 1".to_string());
    }

    if config.openai.timeout_secs == 0 {
        errors.push("openai.timeout_secs must be >= 1".to_string());
    }
    if !(0.0..=2.0).contains(&config.openai.temperature) {
        errors.push(format!(
            "openai.temperature = {:.2} must be within [0, 2]",
            config.openai.temperature
        ));
    }
    if config.openai.base_url.trim().is_empty() {
        errors.push("openai.base_url must not be empty".to_string());
    }

    errors
}
