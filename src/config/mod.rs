//! Pipeline Configuration Module
//!
//! Provides the run configuration loaded from a TOML (or JSON) file.
//!
//! ## Loading Order
//!
//! 1. `--config` command-line flag
//! 2. `AIRLINE_CONFIG` environment variable (path to the file)
//! 3. `config.toml` / `config.json` in the working directory, then its parent
//!
//! A missing file is a fatal startup error. `OPENAI_API_KEY` overrides the key
//! found in the file.
//!
//! ## Usage
//!
//! ```ignore
//! let config = PipelineConfig::load(args.config.as_deref())?;
//! let orchestrator = PipelineOrchestrator::new(&config, generator)?;
//! ```

mod pipeline_config;
pub mod defaults;
pub mod validation;

pub use pipeline_config::*;
