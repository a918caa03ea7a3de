//! Benchmark execution
//!
//! A [`BenchmarkRunner`] turns a [`RunSpec`] into a lazy stream of captured
//! results, one per repetition. Each element launches a fresh runtime process
//! when it is polled and completes when that process exits, so repetition
//! `n + 1` never starts before repetition `n` has finished.
//!
//! # Invocation layout
//!
//! ```text
//! <runtime> <runtime_flags...> -classpath <a:b:c> <identifier> <iterations> <input> <expected>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use suite_harness::process::SystemProcessRunner;
//! use suite_harness::runner::BenchmarkRunner;
//! use suite_harness::suite::RunSpec;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let runner = BenchmarkRunner::new("/usr/bin/java", vec!["target/classes".into()])?;
//! let spec = RunSpec::new("bounce.BounceBenchmark", "100").with_repetitions(3);
//!
//! let mut results = std::pin::pin!(runner.run(&spec, &SystemProcessRunner));
//! while let Some(result) = results.next().await {
//!     let captured = result?;
//!     println!("{} #{}: {} bytes", captured.identifier, captured.repetition, captured.payload.len());
//! }
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, Stream, StreamExt};
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::error::{HarnessError, Result};
use crate::process::{Invocation, ProcessRunner};
use crate::suite::RunSpec;

/// Standard output of one successful repetition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResult {
    pub identifier: String,
    pub repetition: u32,
    /// Captured standard output, byte for byte
    pub payload: Vec<u8>,
    /// Wall-clock time of the process, launch to exit
    pub duration: Duration,
}

/// Builds runtime invocations and executes repetitions
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    runtime: PathBuf,
    runtime_flags: Vec<String>,
    classpath_option: String,
    classpath: String,
}

impl BenchmarkRunner {
    /// Runner with the default heap bounds and `-classpath` option
    ///
    /// # Errors
    ///
    /// Fails when a classpath entry contains the platform path separator and
    /// therefore cannot be joined unambiguously.
    pub fn new(runtime: impl Into<PathBuf>, classpath: Vec<PathBuf>) -> Result<Self> {
        let joined = env::join_paths(&classpath)
            .map_err(|e| HarnessError::Config(format!("unjoinable classpath: {}", e)))?;

        Ok(Self {
            runtime: runtime.into(),
            runtime_flags: vec!["-Xms1024M".to_string(), "-Xmx1024M".to_string()],
            classpath_option: "-classpath".to_string(),
            classpath: joined.to_string_lossy().into_owned(),
        })
    }

    pub fn with_runtime_flags(mut self, flags: Vec<String>) -> Self {
        self.runtime_flags = flags;
        self
    }

    pub fn with_classpath_option(mut self, option: impl Into<String>) -> Self {
        self.classpath_option = option.into();
        self
    }

    /// The command line for one repetition of `spec`
    ///
    /// Deterministic for a given spec and runner; repetitions share it.
    pub fn invocation(&self, spec: &RunSpec) -> Invocation {
        Invocation::new(&self.runtime)
            .args(self.runtime_flags.iter().cloned())
            .arg(self.classpath_option.as_str())
            .arg(self.classpath.as_str())
            .arg(spec.identifier.as_str())
            .arg(spec.iterations.to_string())
            .arg(spec.input.as_str())
            .arg(spec.expected_output.as_str())
    }

    /// Lazily execute every repetition of `spec` in index order
    ///
    /// The stream has exactly `spec.repetitions` elements. Nothing is launched
    /// until it is polled, and a spec with zero repetitions launches nothing.
    /// A failed repetition is yielded as an error and does not end the stream.
    pub fn run<'a>(
        &'a self,
        spec: &'a RunSpec,
        processes: &'a dyn ProcessRunner,
    ) -> impl Stream<Item = Result<CapturedResult>> + 'a {
        stream::iter(0..spec.repetitions)
            .then(move |repetition| self.run_repetition(spec, repetition, processes))
    }

    #[instrument(skip(self, spec, processes), fields(benchmark = %spec.identifier))]
    async fn run_repetition(
        &self,
        spec: &RunSpec,
        repetition: u32,
        processes: &dyn ProcessRunner,
    ) -> Result<CapturedResult> {
        let invocation = self.invocation(spec);
        info!(">>> {}", invocation);

        let started = Instant::now();
        let output = processes
            .execute(&invocation)
            .await
            .map_err(|source| HarnessError::Launch {
                program: invocation.program.clone(),
                source,
            })?;
        let duration = started.elapsed();

        if !output.success {
            return Err(HarnessError::Run {
                identifier: spec.identifier.clone(),
                repetition,
                status: output.status_description(),
                stderr: output.stderr,
            });
        }

        debug!(
            bytes = output.stdout.len(),
            elapsed_ms = duration.as_millis() as u64,
            "repetition captured"
        );

        Ok(CapturedResult {
            identifier: spec.identifier.clone(),
            repetition,
            payload: output.stdout,
            duration,
        })
    }
}
