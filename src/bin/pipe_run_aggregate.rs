//! Pipe Run Aggregation Binary
//!
//! Reads a segment export, aggregates it per run, and writes the entity
//! record set for the downstream model importer.
//!
//! ## Configuration
//!
//! First argument: path to a JSON config file (default: `config.json`) with
//! `revit_export_path`, `processed_data_path` and an optional `engine` block.
//!
//! Environment overrides:
//! - `PIPE_RUN_INPUT`: segment export path
//! - `PIPE_RUN_OUTPUT`: output record set path
//! - `PIPE_RUN_TOLERANCE`: snapping tolerance in meters
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for terminals (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin pipe_run_aggregate -- config.json
//! ```

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use pipe_run_kernel::{AggregationEngine, CsvFileSource, PipelineConfig};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pipe_run_aggregate=info,pipe_run_kernel=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}

/// Load the config file and apply environment overrides.
fn load_config() -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let mut config = PipelineConfig::load(&config_path)?;
    info!(path = %config_path.display(), "configuration loaded");

    if let Ok(input) = std::env::var("PIPE_RUN_INPUT") {
        config.input_path = PathBuf::from(input);
    }
    if let Ok(output) = std::env::var("PIPE_RUN_OUTPUT") {
        config.output_path = PathBuf::from(output);
    }
    if let Ok(raw) = std::env::var("PIPE_RUN_TOLERANCE") {
        match raw.parse::<f64>() {
            Ok(tolerance) => config.engine.tolerance = tolerance,
            Err(_) => warn!(value = %raw, "ignoring unparseable PIPE_RUN_TOLERANCE"),
        }
    }

    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting pipe run aggregation");

    let config = load_config().map_err(|e| {
        error!(error = %e, "failed to load configuration");
        e
    })?;

    let engine = AggregationEngine::new(config.engine.clone())?;
    info!(
        tolerance = engine.config().tolerance,
        tie_break = ?engine.config().tie_break,
        layout = ?engine.config().layout,
        params_hash = %engine.config().params_hash(),
        "engine initialized"
    );

    let started = Instant::now();
    let source = CsvFileSource::new(&config.input_path);
    let output = match engine.run(&source) {
        Ok(output) => output,
        Err(e) => {
            error!(
                input = %config.input_path.display(),
                error = %e,
                "aggregation aborted; no output written"
            );
            return Err(e.into());
        }
    };

    output.write_to(&config.output_path).map_err(|e| {
        error!(output = %config.output_path.display(), error = %e, "failed to write output");
        e
    })?;

    info!(
        output = %config.output_path.display(),
        runs = output.report.runs,
        rows_written = output.rows.len(),
        errors = output.report.error_count(),
        output_hash = %output.report.output_hash,
        latency_ms = started.elapsed().as_millis() as u64,
        "record set written"
    );

    Ok(())
}
