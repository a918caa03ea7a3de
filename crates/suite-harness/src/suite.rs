//! Run specifications
//!
//! A [`RunSpec`] is the fully materialized description of one benchmark unit.
//! Specs are built from the static configuration before anything executes and
//! are never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::{BenchmarkEntry, SuiteConfig};
use crate::error::{HarnessError, Result};

/// One benchmark unit and how often to run it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Qualified benchmark name, e.g. `bounce.BounceBenchmark`
    pub identifier: String,
    /// Opaque input payload passed as a positional argument
    pub input: String,
    /// Opaque expected-output payload, may be empty
    pub expected_output: String,
    /// Workload iterations inside a single process
    pub iterations: u32,
    /// Number of process launches
    pub repetitions: u32,
}

impl RunSpec {
    pub fn new(identifier: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            input: input.into(),
            expected_output: String::new(),
            iterations: 1,
            repetitions: 1,
        }
    }

    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }
}

/// Materialize the suite in declaration order
///
/// Named entries read `<input_dir>/<identifier>` and `<output_dir>/<identifier>`
/// relative to `project_root`, with surrounding whitespace trimmed. A missing
/// file is a fatal [`HarnessError::SuiteInput`].
pub fn load_suite(suite: &SuiteConfig, project_root: &Path) -> Result<Vec<RunSpec>> {
    suite
        .benchmarks
        .iter()
        .map(|entry| match entry {
            BenchmarkEntry::Named(identifier) => {
                let input = read_trimmed(&project_root.join(&suite.input_dir).join(identifier))?;
                let expected =
                    read_trimmed(&project_root.join(&suite.output_dir).join(identifier))?;
                Ok(RunSpec {
                    identifier: identifier.clone(),
                    input,
                    expected_output: expected,
                    iterations: suite.iterations,
                    repetitions: suite.repetitions,
                })
            }
            BenchmarkEntry::Inline(inline) => Ok(RunSpec {
                identifier: inline.identifier.clone(),
                input: inline.input.clone(),
                expected_output: inline.expected_output.clone(),
                iterations: inline.iterations.unwrap_or(suite.iterations),
                repetitions: inline.repetitions.unwrap_or(suite.repetitions),
            }),
        })
        .collect()
}

fn read_trimmed(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|source| HarnessError::SuiteInput {
            path: path.to_path_buf(),
            source,
        })
}
