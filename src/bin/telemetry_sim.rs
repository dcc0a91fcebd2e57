//! Engine Telemetry Simulation
//!
//! Streams synthetic aircraft engine readings to stdout, with the same
//! anomaly injection the pipeline uses internally. Useful for eyeballing the
//! generator or feeding other tools.
//!
//! # Usage
//! ```bash
//! ./telemetry-sim --count 100 --anomaly-probability 0.3 --seed 42
//! ./telemetry-sim --format csv --quiet > telemetry.csv
//! ```

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::time::Duration;

use airline_orchestrator::acquisition::TelemetrySimulator;
use airline_orchestrator::agents::ThresholdScreener;
use airline_orchestrator::config::defaults;
use airline_orchestrator::TelemetryReading;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "telemetry-sim")]
#[command(about = "Synthetic aircraft engine telemetry generator")]
#[command(version)]
struct Args {
    /// Number of readings to emit
    #[arg(short = 'n', long, default_value = "20")]
    count: u64,

    /// Probability of injecting an anomaly into each reading
    #[arg(short = 'p', long, default_value_t = defaults::ANOMALY_PROBABILITY)]
    anomaly_probability: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between readings in milliseconds
    #[arg(long, default_value = "0")]
    interval_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Suppress the run log on stderr (only output readings)
    #[arg(short, long)]
    quiet: bool,
}

fn log_run(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

/// Log directive for the stderr subscriber; `--quiet` silences screening logs too.
fn log_directive(quiet: bool) -> String {
    if quiet {
        return "off".to_string();
    }
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

fn csv_line(r: &TelemetryReading, threshold_flag: bool) -> String {
    format!(
        "{},{},{:.1},{:.1},{:.3},{:.1},{},{},{}",
        r.cycle,
        r.timestamp.to_rfc3339(),
        r.rpm,
        r.pressure,
        r.vibration,
        r.egt,
        r.anomaly_type.map_or("", |a| a.as_str()),
        r.anomaly_severity.map_or("", |s| s.as_str()),
        threshold_flag,
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Readings own stdout, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_directive(args.quiet)))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if !(0.0..=1.0).contains(&args.anomaly_probability) {
        return Err(format!("anomaly probability {} outside [0, 1]", args.anomaly_probability).into());
    }

    let mut simulator = match args.seed {
        Some(seed) => TelemetrySimulator::with_seed(args.anomaly_probability, seed),
        None => TelemetrySimulator::new(args.anomaly_probability),
    };
    let screener = ThresholdScreener::new();

    log_run(&"=".repeat(60), args.quiet);
    log_run("ENGINE TELEMETRY SIMULATION", args.quiet);
    log_run(&format!("  Readings: {}", args.count), args.quiet);
    log_run(&format!("  Anomaly probability: {:.2}", args.anomaly_probability), args.quiet);
    if let Some(seed) = args.seed {
        log_run(&format!("  Random seed: {seed}"), args.quiet);
    }
    log_run(&"=".repeat(60), args.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.format == OutputFormat::Csv {
        writeln!(out, "cycle,timestamp,rpm,pressure,vibration,egt,anomaly_type,anomaly_severity,threshold_flag")?;
    }

    let mut threshold_flags = 0u64;
    for i in 0..args.count {
        let reading = simulator.next_reading();
        let flagged = screener.screen(&reading).anomalies_detected;
        if flagged {
            threshold_flags += 1;
        }

        match args.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&reading)?)?,
            OutputFormat::Csv => writeln!(out, "{}", csv_line(&reading, flagged))?,
        }
        out.flush()?;

        if args.interval_ms > 0 && i + 1 < args.count {
            std::thread::sleep(Duration::from_millis(args.interval_ms));
        }
    }

    log_run(&"=".repeat(60), args.quiet);
    log_run(
        &format!(
            "Done: {} readings | {} injected anomalies | {} threshold flags",
            args.count,
            simulator.anomalies_injected(),
            threshold_flags
        ),
        args.quiet,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_turns_logging_off() {
        assert_eq!(log_directive(true), "off");
    }

    #[test]
    fn test_csv_line_carries_threshold_flag() {
        let reading = TelemetryReading::new(3, 9000.0, 900.0, 0.4, 750.0);
        let flagged = ThresholdScreener::new().screen(&reading).anomalies_detected;
        let line = csv_line(&reading, flagged);
        assert!(line.starts_with("3,"));
        assert!(line.ends_with(",true"), "{line}");
        assert!(line.contains(",9000.0,900.0,0.400,750.0,"));
    }
}
