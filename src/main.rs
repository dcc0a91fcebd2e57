//! Airline Orchestrator - aircraft telemetry anomaly pipeline
//!
//! # Usage
//!
//! ```bash
//! # Run the default 8 cycles using ./config.toml
//! cargo run --release
//!
//! # Reproducible short run, dumping the cycle history
//! cargo run --release -- --cycles 3 --seed 7 --history-json history.json
//!
//! # Verify the configured API key with one cheap request
//! cargo run --release -- check-key
//! ```
//!
//! # Environment Variables
//!
//! - `AIRLINE_CONFIG`: Path to the config file (TOML or JSON)
//! - `OPENAI_API_KEY`: Overrides `openai_api_key` from the config file
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use airline_orchestrator::config::{mask_api_key, ModelRole};
use airline_orchestrator::{OpenAiClient, PipelineConfig, PipelineOrchestrator, TextGenerator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "airline-orchestrator")]
#[command(about = "Aircraft telemetry anomaly detection, diagnosis and resolution pipeline")]
#[command(version)]
struct CliArgs {
    /// Config file (TOML or JSON). Defaults to $AIRLINE_CONFIG, then
    /// config.toml / config.json in the current or parent directory
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override orchestrator.num_cycles
    #[arg(long, value_name = "N")]
    cycles: Option<u32>,

    /// Override orchestrator.anomaly_probability (0.0 - 1.0)
    #[arg(long, value_name = "P")]
    anomaly_probability: Option<f64>,

    /// Override orchestrator.cycle_interval_ms (0 = no pacing)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Seed the telemetry simulator for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write the full cycle history as JSON when the run ends
    #[arg(long, value_name = "PATH")]
    history_json: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the telemetry pipeline (default)
    Run,

    /// Show the masked API key and make one test request with the monitoring model
    CheckKey,
}

impl CliArgs {
    /// Fold CLI overrides into the loaded config, then re-validate.
    fn apply_overrides(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(n) = self.cycles {
            config.orchestrator.num_cycles = n;
        }
        if let Some(p) = self.anomaly_probability {
            config.orchestrator.anomaly_probability = p;
        }
        if let Some(ms) = self.interval_ms {
            config.orchestrator.cycle_interval_ms = ms;
        }
        if self.seed.is_some() {
            config.orchestrator.seed = self.seed;
        }
        config.validate().context("Invalid configuration after CLI overrides")?;
        Ok(())
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Spawns a listener that cancels the returned token once `signal` resolves.
///
/// The runtime is single-threaded, so the listener only registers its signal
/// handler when first polled. Yielding once here makes sure that happens
/// before the caller starts any blocking work.
async fn cancel_on<F>(signal: F) -> CancellationToken
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if signal.await.is_ok() {
            info!("🛑 Received Ctrl+C, finishing current cycle...");
            trigger.cancel();
        }
    });
    tokio::task::yield_now().await;
    token
}

async fn run_pipeline(args: &CliArgs, config: &PipelineConfig, generator: Arc<dyn TextGenerator>) -> Result<()> {
    // Graceful shutdown via Ctrl+C, armed before detector training blocks the thread
    let cancel_token = cancel_on(tokio::signal::ctrl_c()).await;

    info!(
        n_samples = config.ml_model.n_samples,
        contamination = config.ml_model.contamination,
        "🧠 Training outlier detector on synthetic baseline..."
    );
    let mut orchestrator =
        PipelineOrchestrator::new(config, generator).context("Failed to initialize outlier detector")?;

    let summary = orchestrator.run(&cancel_token).await.context("Pipeline aborted")?;

    if let Some(path) = &args.history_json {
        let json = serde_json::to_string_pretty(orchestrator.history())
            .context("Failed to serialize cycle history")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Cycle history written to {}", path.display());
    }

    if summary.interrupted {
        warn!("Run interrupted after {} of {} cycles", summary.total_cycles, orchestrator.num_cycles());
    }
    Ok(())
}

async fn check_key(config: &PipelineConfig, generator: Arc<dyn TextGenerator>) -> Result<()> {
    let key = config.api_key()?;
    info!("✓ API key loaded: {}", mask_api_key(key));

    let model = config.model_for(ModelRole::Monitoring);
    info!("Testing API key against {} with model {}...", generator.backend_name(), model);

    let reply = generator
        .generate(
            "You are a connectivity check.",
            "Say 'API key is working' if you can read this.",
            model,
        )
        .await
        .context("API key test request failed")?;

    info!("✓ API response: {}", reply.trim());
    info!("✓ API key is valid and working");
    Ok(())
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config)?;

    let api_key = config.api_key()?;
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiClient::new(&config.openai, api_key).context("Failed to build HTTP client")?,
    );

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Airline Orchestrator");
    info!("  Aircraft Telemetry Anomaly Pipeline");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "🤖 Models: diagnosis={} | resolution={}",
        config.model_for(ModelRole::Diagnosis),
        config.model_for(ModelRole::Resolution)
    );

    match args.command {
        Some(SubCommand::CheckKey) => check_key(&config, generator).await,
        Some(SubCommand::Run) | None => run_pipeline(&args, &config, generator).await,
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    // Stages run strictly in sequence, one thread is enough
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => {
            info!("✓ Airline Orchestrator finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
