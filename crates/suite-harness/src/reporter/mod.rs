//! Run report rendering
//!
//! # Output Formats
//!
//! - **JSON**: Machine-readable format for later analysis
//! - **Console**: Human-readable summary of stored and failed repetitions
//!
//! # Example
//!
//! ```no_run
//! use suite_harness::harness::RunReport;
//! use suite_harness::reporter::{OutputFormat, Reporter};
//!
//! # fn example(report: RunReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! Reporter::new(OutputFormat::JsonPretty).write_to_file(&report, "results/report.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::harness::RunReport;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON format for machine parsing
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Console summary
    #[default]
    Console,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" => Ok(OutputFormat::JsonPretty),
            "console" => Ok(OutputFormat::Console),
            other => Err(format!(
                "unknown format '{}' (expected console, json or json-pretty)",
                other
            )),
        }
    }
}

/// Reporter for run reports
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report to stdout
    pub fn report(&self, report: &RunReport) -> Result<()> {
        let output = self.format_report(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Write to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(&self, report: &RunReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_report(report)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Console => ConsoleReporter::format(report),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::harness::{BenchmarkOutcome, RepetitionOutcome};
    use std::path::PathBuf;

    pub(crate) fn create_test_report() -> RunReport {
        RunReport {
            suite_name: "Test Suite".to_string(),
            results_root: PathBuf::from("/work/results"),
            started_at: "2024-01-01T00:00:00Z".to_string(),
            total_duration_ms: 5000,
            benchmarks: vec![BenchmarkOutcome {
                identifier: "bounce.BounceBenchmark".to_string(),
                iterations: 10000,
                requested: 2,
                repetitions: vec![
                    RepetitionOutcome::Stored {
                        repetition: 0,
                        path: PathBuf::from("/work/results/bounce.BounceBenchmark/0"),
                        bytes: 48000,
                        duration_ms: 2100,
                    },
                    RepetitionOutcome::Failed {
                        repetition: 1,
                        error: "exit code 1".to_string(),
                    },
                ],
                aborted: None,
                duration_ms: 4300,
            }],
        }
    }

    #[test]
    fn test_reporter_json_format() {
        let report = create_test_report();
        let output = Reporter::new(OutputFormat::Json)
            .format_report(&report)
            .unwrap();

        assert!(output.contains("Test Suite"));
        assert!(output.contains("bounce.BounceBenchmark"));
    }

    #[test]
    fn test_reporter_console_format() {
        let report = create_test_report();
        let output = Reporter::new(OutputFormat::Console)
            .format_report(&report)
            .unwrap();

        assert!(output.contains("Test Suite"));
        assert!(output.contains("bounce.BounceBenchmark"));
    }

    #[test]
    fn test_write_to_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/run.json");
        Reporter::new(OutputFormat::JsonPretty)
            .write_to_file(&create_test_report(), &path)
            .unwrap();

        let parsed: RunReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.benchmarks.len(), 1);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("json-pretty".parse::<OutputFormat>(), Ok(OutputFormat::JsonPretty));
        assert_eq!("console".parse::<OutputFormat>(), Ok(OutputFormat::Console));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_default_format() {
        let reporter = Reporter::default();
        assert_eq!(reporter.format, OutputFormat::Console);
    }
}
