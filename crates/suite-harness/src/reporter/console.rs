//! Console reporter for run reports
//!
//! Provides a compact human-readable summary with status indicators.

use anyhow::Result;
use std::fmt::Write;

use crate::harness::{BenchmarkOutcome, RunReport};

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Format a run report for console output
    pub fn format(report: &RunReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                       SUITE RESULTS                          ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Suite:     {}", report.suite_name)?;
        writeln!(output, "Results:   {}", report.results_root.display())?;
        writeln!(output, "Started:   {}", report.started_at)?;
        writeln!(output, "Duration:  {}ms", report.total_duration_ms)?;
        writeln!(output)?;

        writeln!(output, "  ┌────────────────────────────────────┬────────┬────────┬──────────┐")?;
        writeln!(output, "  │ Benchmark                          │ Stored │ Failed │ Time     │")?;
        writeln!(output, "  ├────────────────────────────────────┼────────┼────────┼──────────┤")?;
        for benchmark in &report.benchmarks {
            Self::format_row(&mut output, benchmark)?;
        }
        writeln!(output, "  └────────────────────────────────────┴────────┴────────┴──────────┘")?;

        writeln!(output)?;
        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        let (symbol, status) = if report.is_clean() {
            ("✓", "COMPLETE")
        } else {
            ("✗", "COMPLETE WITH FAILURES")
        };
        writeln!(
            output,
            "Overall Status: {} {} ({} stored, {} failed)",
            symbol,
            status,
            report.stored_count(),
            report.failed_count()
        )?;

        let failures = report.failures();
        if !failures.is_empty() {
            writeln!(output)?;
            writeln!(output, "Failures:")?;
            for failure in &failures {
                writeln!(output, "  • {}", failure.lines().next().unwrap_or_default())?;
            }
        }

        writeln!(output)?;
        Ok(output)
    }

    fn format_row(output: &mut String, benchmark: &BenchmarkOutcome) -> Result<()> {
        let name = if benchmark.aborted.is_some() {
            format!("{} (aborted)", benchmark.identifier)
        } else {
            benchmark.identifier.clone()
        };
        writeln!(
            output,
            "  │ {:<34} │ {:>6} │ {:>6} │ {:>6}ms │",
            truncate(&name, 34),
            format!("{}/{}", benchmark.stored_count(), benchmark.requested),
            benchmark.failed_count(),
            benchmark.duration_ms
        )?;
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars - 1).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::tests::create_test_report;

    #[test]
    fn test_console_lists_benchmarks_and_failures() {
        let output = ConsoleReporter::format(&create_test_report()).unwrap();

        assert!(output.contains("Test Suite"));
        assert!(output.contains("bounce.BounceBenchmark"));
        assert!(output.contains("1/2"));
        assert!(output.contains("COMPLETE WITH FAILURES"));
        assert!(output.contains("bounce.BounceBenchmark #1: exit code 1"));
    }

    #[test]
    fn test_console_clean_run() {
        let mut report = create_test_report();
        report.benchmarks[0].repetitions.truncate(1);
        report.benchmarks[0].requested = 1;

        let output = ConsoleReporter::format(&report).unwrap();
        assert!(output.contains("✓ COMPLETE"));
        assert!(!output.contains("Failures:"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("deltablue.DeltaBlueBenchmark", 10), "deltablue…");
    }
}
