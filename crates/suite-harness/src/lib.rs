//! Benchmark suite execution harness
//!
//! This crate builds a project of benchmark programs once, runs each benchmark
//! a configurable number of times and stores every repetition's standard
//! output under a deterministic path for later analysis.
//!
//! # Features
//!
//! - **Tool resolution**: build tool and runtime are looked up on `PATH`
//! - **Reproducible builds**: the toolchain version is pinned before compiling
//! - **Sequential execution**: one process at a time, repetitions in order
//! - **Idempotent storage**: `results/<identifier>/<repetition>`, atomically replaced
//! - **Run reports**: console summary and JSON
//!
//! # Example
//!
//! ```no_run
//! use suite_harness::{Config, Harness, OutputFormat, Reporter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("suite.toml")?;
//! let report = Harness::new(config).run().await?;
//!
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [toolchain]
//! scala_version = "2.11.12"
//!
//! [harness]
//! results_root = "results"
//! runtime_flags = ["-Xms1024M", "-Xmx1024M"]
//!
//! [suite]
//! name = "smoke"
//! iterations = 10
//! repetitions = 3
//! benchmarks = [
//!     "list.ListBenchmark",
//!     { identifier = "bounce.BounceBenchmark", input = "100", expected_output = "1331" },
//! ]
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod harness;
pub mod process;
pub mod reporter;
pub mod resolve;
pub mod runner;
pub mod store;
pub mod suite;

// Re-export main types for convenience
pub use config::Config;
pub use error::HarnessError;
pub use harness::{BenchmarkOutcome, Harness, RepetitionOutcome, RunReport};
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use reporter::{OutputFormat, Reporter};
pub use resolve::PathResolver;
pub use runner::{BenchmarkRunner, CapturedResult};
pub use store::ResultStore;
pub use suite::RunSpec;
