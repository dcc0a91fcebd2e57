//! Default values for every config key, plus fixed constants shared by the
//! detector, the text-generation client and config discovery.

// ============================================================================
// Orchestrator
// ============================================================================

/// Cycles processed by one run.
pub const NUM_CYCLES: u32 = 8;

/// Probability that the simulator injects an anomaly into a reading.
pub const ANOMALY_PROBABILITY: f64 = 0.15;

/// Pacing delay between cycles (ms), emulating a live feed.
pub const CYCLE_INTERVAL_MS: u64 = 1_000;

// ============================================================================
// ML Engine
// ============================================================================

/// Synthetic baseline samples used to train the detector.
pub const ML_N_SAMPLES: usize = 1_000;

/// Expected fraction of outliers; sets the decision offset.
pub const ML_CONTAMINATION: f64 = 0.1;

/// Trees in the isolation forest.
pub const ML_N_ESTIMATORS: usize = 100;

/// Upper bound on the per-tree sub-sample size.
pub const ML_MAX_SAMPLES: usize = 256;

/// Seed for baseline generation and forest construction.
///
/// Fixed so that two runs with the same config confirm the same readings.
pub const ML_SEED: u64 = 42;

// ============================================================================
// Text Generation
// ============================================================================

/// OpenAI-compatible API root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Request timeout for a single generation call (seconds).
pub const OPENAI_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature for diagnosis and resolution calls.
pub const OPENAI_TEMPERATURE: f64 = 0.3;

pub const DIAGNOSIS_MODEL: &str = "gpt-4-turbo";
pub const RESOLUTION_MODEL: &str = "gpt-4-turbo";
pub const MONITORING_MODEL: &str = "gpt-4o-mini";

/// Model family that rejects any temperature other than the default and
/// takes `max_completion_tokens` instead of `max_tokens`.
pub const DEFAULT_TEMPERATURE_ONLY_FAMILY: &str = "gpt-5";

/// Output cap per completion.
pub const MAX_OUTPUT_TOKENS: u32 = 500;

/// Value shipped in the example config; treated as "not configured".
pub const API_KEY_PLACEHOLDER: &str = "your-openai-api-key-here";

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "AIRLINE_CONFIG";

/// Environment variable that supplies or overrides the API key.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Candidate config files, searched in order relative to the working directory.
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",
    "config.json",
    "../config.toml",
    "../config.json",
];
