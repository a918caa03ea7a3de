//! Error taxonomy for the harness
//!
//! Resolution, build and configuration errors are fatal and surface at the
//! process boundary. Run and storage errors are scoped to a single benchmark
//! and are handled by the orchestrator according to its failure policy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while preparing, building or running a suite
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A required tool could not be located on the search path
    #[error("could not resolve {tool} '{name}' on the search path")]
    Resolution {
        /// Role of the tool ("build tool" or "runtime")
        tool: &'static str,
        /// Name that was looked up
        name: String,
    },

    /// The build command exited unsuccessfully
    #[error("build failed ({status}): {stderr}")]
    Build {
        /// Rendered exit status
        status: String,
        /// Captured standard error of the build
        stderr: String,
    },

    /// A process could not be launched at all
    #[error("failed to launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A benchmark repetition exited unsuccessfully
    #[error("{identifier} repetition {repetition} failed ({status}): {stderr}")]
    Run {
        identifier: String,
        repetition: u32,
        status: String,
        stderr: String,
    },

    /// Writing into the results tree failed
    #[error("storage failure at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A per-benchmark input or expected-output file could not be read
    #[error("failed to read suite input {}: {source}", .path.display())]
    SuiteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is structurally valid TOML but semantically wrong
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HarnessError {
    /// Whether this error must abort the whole harness regardless of policy
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::Resolution { .. }
                | HarnessError::Build { .. }
                | HarnessError::Config(_)
                | HarnessError::SuiteInput { .. }
        )
    }

    /// Storage error for `path`
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, HarnessError>;
