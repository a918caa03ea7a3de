//! Suite harness binary
//!
//! Builds the benchmark project, runs the configured suite and prints a
//! summary. Exits non-zero when tools cannot be resolved, the configuration
//! is invalid, the build fails, or a strict run hits a failure. Individual
//! failed repetitions in a non-strict run still exit zero.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use suite_harness::config::Config;
use suite_harness::{Harness, OutputFormat, Reporter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "suite-harness")]
#[command(version, about = "Build a benchmark project and record repeated runs")]
struct Args {
    /// Suite configuration file
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Bundled suite to run when no config file is given
    #[arg(short, long, default_value = "full", value_parser = ["full", "bounce"])]
    preset: String,

    /// Project root (overrides the config)
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Results directory (overrides the config)
    #[arg(long)]
    results_root: Option<PathBuf>,

    /// Repetitions per benchmark (overrides the suite default)
    #[arg(long)]
    repetitions: Option<u32>,

    /// Iterations per repetition (overrides the suite default)
    #[arg(long)]
    iterations: Option<u32>,

    /// Abort on the first failed repetition
    #[arg(long)]
    strict: bool,

    /// Also write the report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Format of the report file: console, json or json-pretty
    #[arg(long, default_value = "json-pretty")]
    format: OutputFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // stdout carries the report, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::preset(&args.preset)?,
    };

    if let Some(root) = args.project_root {
        config.harness.project_root = root;
    }
    if let Some(root) = args.results_root {
        config.harness.results_root = root;
    }
    if let Some(repetitions) = args.repetitions {
        config.suite.repetitions = repetitions;
    }
    if let Some(iterations) = args.iterations {
        config.suite.iterations = iterations;
    }
    config.harness.strict |= args.strict;
    config.validate()?;

    tracing::info!("Starting suite-harness v{}", env!("CARGO_PKG_VERSION"));
    let report = Harness::new(config).run().await?;

    Reporter::new(OutputFormat::Console).report(&report)?;
    if let Some(path) = &args.report {
        Reporter::new(args.format)
            .write_to_file(&report, path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}
