//! Pipeline Configuration - every tunable as a TOML (or JSON) value
//!
//! Each struct implements `Default` with the documented defaults, so an empty
//! file yields a runnable configuration apart from the API key.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("Config I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error ({}): {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Config validation failed:\n{}", bullet_list(.0))]
    Validation(Vec<String>),

    #[error(
        "OpenAI API key not configured: set 'openai_api_key' in the config file or the {} environment variable",
        defaults::API_KEY_ENV_VAR
    )]
    MissingApiKey,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one orchestrator run.
///
/// Constructed once at startup and passed by reference into the orchestrator
/// and each stage constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// OpenAI API key; `$OPENAI_API_KEY` takes precedence when set
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Text-generation endpoint settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Model names per agent role
    #[serde(default)]
    pub models: ModelConfig,

    /// Cycle loop settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Outlier detector training settings
    #[serde(default)]
    pub ml_model: MlModelConfig,
}

impl PipelineConfig {
    /// Locate and load the config file, then apply environment overrides.
    ///
    /// Search order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `$AIRLINE_CONFIG`
    /// 3. `./config.toml`, `./config.json`, `../config.toml`, `../config.json`
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::discover(explicit)?;
        let mut config = Self::load_from_file(&path)?;
        info!(path = %path.display(), "Loaded pipeline config");
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve which config file to read.
    pub fn discover(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let mut searched = Vec::new();

        if let Some(p) = explicit {
            if p.exists() {
                return Ok(p.to_path_buf());
            }
            return Err(ConfigError::NotFound {
                searched: vec![p.to_path_buf()],
            });
        }

        if let Ok(env_path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&env_path);
            if p.exists() {
                return Ok(p);
            }
            warn!(path = %env_path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            searched.push(p);
        }

        for candidate in defaults::CONFIG_SEARCH_PATHS {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Ok(p);
            }
            searched.push(p);
        }

        Err(ConfigError::NotFound { searched })
    }

    /// Load from a specific file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let value = if is_json {
            super::validation::json_to_toml(&contents)
        } else {
            contents.parse::<toml::Value>().map_err(|e| e.to_string())
        }
        .map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        Self::from_value(value).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse a TOML document held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let value = contents
            .parse::<toml::Value>()
            .map_err(|e| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Two-pass: warn on unknown keys, then deserialize and validate.
    fn from_value(value: toml::Value) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(&value) {
            warn!("{}", w);
        }

        let config = value.try_into::<Self>().map_err(|e: toml::de::Error| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `$OPENAI_API_KEY` wins over the file value when non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(defaults::API_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.openai_api_key = Some(key);
            }
        }
    }

    /// Validate value ranges. Collects every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// The configured API key, rejecting blanks and the shipped placeholder.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != defaults::API_KEY_PLACEHOLDER => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Model name for an agent role.
    pub fn model_for(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Diagnosis => &self.models.diagnosis,
            ModelRole::Resolution => &self.models.resolution,
            ModelRole::Monitoring => &self.models.monitoring,
        }
    }
}

/// Mask an API key for display: first 7 and last 4 characters kept.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 11 {
        let head: String = chars[..7].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 11))
    } else {
        "*".repeat(chars.len())
    }
}

// ============================================================================
// Text Generation Endpoint
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API root; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_base_url() -> String {
    defaults::OPENAI_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    defaults::OPENAI_TIMEOUT_SECS
}
fn default_temperature() -> f64 {
    defaults::OPENAI_TEMPERATURE
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

/// Agent roles that may be assigned their own model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Diagnosis,
    Resolution,
    Monitoring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_diagnosis_model")]
    pub diagnosis: String,

    #[serde(default = "default_resolution_model")]
    pub resolution: String,

    /// Used for the API key check
    #[serde(default = "default_monitoring_model")]
    pub monitoring: String,
}

fn default_diagnosis_model() -> String {
    defaults::DIAGNOSIS_MODEL.to_string()
}
fn default_resolution_model() -> String {
    defaults::RESOLUTION_MODEL.to_string()
}
fn default_monitoring_model() -> String {
    defaults::MONITORING_MODEL.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            diagnosis: default_diagnosis_model(),
            resolution: default_resolution_model(),
            monitoring: default_monitoring_model(),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_num_cycles")]
    pub num_cycles: u32,

    #[serde(default = "default_anomaly_probability")]
    pub anomaly_probability: f64,

    /// Delay between cycles (ms). 0 disables pacing.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Telemetry RNG seed; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_cycles() -> u32 {
    defaults::NUM_CYCLES
}
fn default_anomaly_probability() -> f64 {
    defaults::ANOMALY_PROBABILITY
}
fn default_cycle_interval_ms() -> u64 {
    defaults::CYCLE_INTERVAL_MS
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            num_cycles: default_num_cycles(),
            anomaly_probability: default_anomaly_probability(),
            cycle_interval_ms: default_cycle_interval_ms(),
            seed: None,
        }
    }
}

// ============================================================================
// ML Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlModelConfig {
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,

    #[serde(default = "default_contamination")]
    pub contamination: f64,

    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
}

fn default_n_samples() -> usize {
    defaults::ML_N_SAMPLES
}
fn default_contamination() -> f64 {
    defaults::ML_CONTAMINATION
}
fn default_n_estimators() -> usize {
    defaults::ML_N_ESTIMATORS
}

impl Default for MlModelConfig {
    fn default() -> Self {
        Self {
            n_samples: default_n_samples(),
            contamination: default_contamination(),
            n_estimators: default_n_estimators(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config = PipelineConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config.orchestrator.num_cycles, 8);
        assert_eq!(config.orchestrator.anomaly_probability, 0.15);
        assert_eq!(config.ml_model.n_samples, 1000);
        assert_eq!(config.ml_model.contamination, 0.1);
        assert_eq!(config.models.diagnosis, "gpt-4-turbo");
        assert_eq!(config.models.resolution, "gpt-4-turbo");
        assert_eq!(config.models.monitoring, "gpt-4o-mini");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
openai_api_key = "sk-test-0123456789abcdef"

[orchestrator]
num_cycles = 3

[models]
diagnosis = "gpt-4o"
"#;
        let config = PipelineConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.orchestrator.num_cycles, 3);
        assert_eq!(config.model_for(ModelRole::Diagnosis), "gpt-4o");
        // Non-overridden values retain defaults
        assert_eq!(config.orchestrator.anomaly_probability, 0.15);
        assert_eq!(config.model_for(ModelRole::Resolution), "gpt-4-turbo");
        assert_eq!(config.api_key().expect("key set"), "sk-test-0123456789abcdef");
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let mut config = PipelineConfig::default();
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey)));

        config.openai_api_key = Some(defaults::API_KEY_PLACEHOLDER.to_string());
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey)));

        config.openai_api_key = Some("   ".to_string());
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = PipelineConfig::default();
        config.orchestrator.num_cycles = 0;
        config.orchestrator.anomaly_probability = 1.5;
        config.ml_model.contamination = 0.9;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "got: {errors:?}");
                assert!(errors.iter().any(|e| e.contains("num_cycles")));
                assert!(errors.iter().any(|e| e.contains("anomaly_probability")));
                assert!(errors.iter().any(|e| e.contains("contamination")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-abcdefghijklmnop"), "sk-abcd********mnop");
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("exactly11ch"), "***********");
    }
}
