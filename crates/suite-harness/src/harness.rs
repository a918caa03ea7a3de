//! Suite orchestration
//!
//! The [`Harness`] drives one complete run:
//!
//! ```text
//! Init ──► Configuring ──► Building ──► Running ──► Complete
//!  │                          │
//!  └─ resolution/config ✗     └─► BuildFailed
//! ```
//!
//! - **Init** resolves the build tool and runtime, loads the suite and expands
//!   the classpath. Anything missing aborts before a process is launched.
//! - **Configuring** writes the toolchain pin.
//! - **Building** runs the build tool once; a failed build aborts the run and
//!   leaves the results tree untouched.
//! - **Running** executes every benchmark in declaration order and every
//!   repetition in index order, strictly one process at a time.
//!
//! # Failure policy
//!
//! By default a failed repetition is logged, a `<n>.failed` marker replaces
//! any stale result for that index, and execution moves on to the next
//! repetition. A storage failure stops the remaining repetitions of that
//! benchmark only. In strict mode the first run or storage failure aborts the
//! whole harness.
//!
//! # Example
//!
//! ```no_run
//! use suite_harness::{Config, Harness};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::preset("bounce")?;
//! let report = Harness::new(config).run().await?;
//! println!("{} repetitions stored", report.stored_count());
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::build::{self, BuildInvoker};
use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::process::{ProcessRunner, SystemProcessRunner};
use crate::resolve::PathResolver;
use crate::runner::{BenchmarkRunner, CapturedResult};
use crate::store::ResultStore;
use crate::suite::{self, RunSpec};

/// Stages of a harness run, used for log context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Configuring,
    Building,
    BuildFailed,
    Running,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Configuring => "configuring",
            Phase::Building => "building",
            Phase::BuildFailed => "build-failed",
            Phase::Running => "running",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Results from a complete harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Name of the suite
    pub suite_name: String,
    /// Where result files were written
    pub results_root: PathBuf,
    /// Timestamp when the run started
    pub started_at: String,
    /// Total duration including the build
    pub total_duration_ms: u64,
    /// One entry per benchmark, in execution order
    pub benchmarks: Vec<BenchmarkOutcome>,
}

impl RunReport {
    pub fn stored_count(&self) -> usize {
        self.benchmarks.iter().map(BenchmarkOutcome::stored_count).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.benchmarks.iter().map(BenchmarkOutcome::failed_count).sum()
    }

    /// True when every repetition of every benchmark was stored
    pub fn is_clean(&self) -> bool {
        self.benchmarks
            .iter()
            .all(|b| b.aborted.is_none() && b.failed_count() == 0)
    }

    /// Human-readable failure lines, prefixed with the benchmark identifier
    pub fn failures(&self) -> Vec<String> {
        self.benchmarks
            .iter()
            .flat_map(|benchmark| {
                let failed = benchmark.repetitions.iter().filter_map(|outcome| match outcome {
                    RepetitionOutcome::Failed { repetition, error } => Some(format!(
                        "{} #{}: {}",
                        benchmark.identifier, repetition, error
                    )),
                    RepetitionOutcome::Stored { .. } => None,
                });
                let aborted = benchmark
                    .aborted
                    .iter()
                    .map(move |reason| format!("{}: aborted: {}", benchmark.identifier, reason));
                failed.chain(aborted).collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Outcome of all repetitions of one benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    pub identifier: String,
    pub iterations: u32,
    /// Requested repetitions
    pub requested: u32,
    /// Outcomes in repetition order; shorter than `requested` when aborted
    pub repetitions: Vec<RepetitionOutcome>,
    /// Storage failure that stopped this benchmark early
    pub aborted: Option<String>,
    pub duration_ms: u64,
}

impl BenchmarkOutcome {
    pub fn stored_count(&self) -> usize {
        self.repetitions
            .iter()
            .filter(|o| matches!(o, RepetitionOutcome::Stored { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.repetitions.len() - self.stored_count()
    }
}

/// What happened to a single repetition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepetitionOutcome {
    Stored {
        repetition: u32,
        path: PathBuf,
        bytes: usize,
        duration_ms: u64,
    },
    Failed {
        repetition: u32,
        error: String,
    },
}

/// Top-level driver for a configured suite
pub struct Harness {
    config: Config,
    resolver: PathResolver,
    processes: Arc<dyn ProcessRunner>,
    home: Option<PathBuf>,
}

impl Harness {
    /// Harness using the process `PATH`, `HOME` and real subprocesses
    pub fn new(config: Config) -> Self {
        Self {
            config,
            resolver: PathResolver::from_env(),
            processes: Arc::new(SystemProcessRunner),
            home: env::var_os("HOME").map(PathBuf::from),
        }
    }

    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_process_runner(mut self, processes: Arc<dyn ProcessRunner>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the whole suite
    ///
    /// # Errors
    ///
    /// Resolution, configuration, suite-input and build failures always abort.
    /// Run and storage failures abort only in strict mode; otherwise they are
    /// recorded in the returned report.
    #[instrument(skip(self), fields(suite = %self.config.suite.name))]
    pub async fn run(&self) -> Result<RunReport> {
        let start_time = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        info!(phase = %Phase::Init, "Preparing suite '{}'", self.config.suite.name);
        let project_root = absolute(&self.config.harness.project_root)?;
        let build_tool = self.resolve("build tool", &self.config.harness.build_tool)?;
        let runtime = self.resolve("runtime", &self.config.harness.runtime)?;
        let specs = suite::load_suite(&self.config.suite, &project_root)?;

        let classpath = self
            .config
            .resolve_classpath(&project_root, self.home.as_deref());
        let runner = BenchmarkRunner::new(runtime, classpath)?
            .with_runtime_flags(self.config.harness.runtime_flags.clone())
            .with_classpath_option(self.config.harness.classpath_option.as_str());
        let store = ResultStore::new(self.config.results_root(&project_root));

        info!(phase = %Phase::Configuring, "Writing toolchain pin");
        build::write_pin(&self.config.toolchain, &self.config.pin_path(&project_root))?;

        info!(phase = %Phase::Building, "Building project");
        let build_output = BuildInvoker::new(build_tool, &project_root)
            .with_args(self.config.harness.build_args.clone())
            .build(self.processes.as_ref())
            .await
            .inspect_err(|e| error!(phase = %Phase::BuildFailed, "{}", e))?;
        debug!("build output:\n{}", build_output);

        info!(
            phase = %Phase::Running,
            "Running {} benchmarks into {}",
            specs.len(),
            store.root().display()
        );
        let total = specs.len();
        let (runner, store) = (&runner, &store);
        let benchmarks: Vec<BenchmarkOutcome> = stream::iter(specs.iter().enumerate())
            .then(move |(position, spec)| {
                info!("[{}/{}] {}", position + 1, total, spec.identifier);
                self.run_benchmark(runner, store, spec)
            })
            .try_collect()
            .await?;

        let report = RunReport {
            suite_name: self.config.suite.name.clone(),
            results_root: store.root().to_path_buf(),
            started_at,
            total_duration_ms: start_time.elapsed().as_millis() as u64,
            benchmarks,
        };

        if report.is_clean() {
            info!(
                phase = %Phase::Complete,
                "Suite '{}' completed: {} results in {}ms",
                report.suite_name,
                report.stored_count(),
                report.total_duration_ms
            );
        } else {
            warn!(
                phase = %Phase::Complete,
                "Suite '{}' completed with {} failed repetitions",
                report.suite_name,
                report.failures().len()
            );
        }

        Ok(report)
    }

    fn resolve(&self, tool: &'static str, name: &str) -> Result<PathBuf> {
        let path = self
            .resolver
            .resolve(name)
            .ok_or_else(|| HarnessError::Resolution {
                tool,
                name: name.to_string(),
            })?;
        info!("Resolved {} '{}' to {}", tool, name, path.display());
        Ok(path)
    }

    /// Run all repetitions of one benchmark and persist each as it arrives
    ///
    /// Outcomes are folded in repetition order. The first step that cannot be
    /// recorded ends the fold before the next repetition is launched.
    #[instrument(skip(self, runner, store, spec), fields(benchmark = %spec.identifier))]
    async fn run_benchmark(
        &self,
        runner: &BenchmarkRunner,
        store: &ResultStore,
        spec: &RunSpec,
    ) -> Result<BenchmarkOutcome> {
        let start_time = Instant::now();

        let folded = runner
            .run(spec, self.processes.as_ref())
            .enumerate()
            .map(|(index, result)| {
                Ok::<_, Halted>(self.record(store, spec, index as u32, result))
            })
            .try_fold(
                Vec::with_capacity(spec.repetitions as usize),
                |mut recorded, step| async move {
                    match step {
                        Ok(outcome) => {
                            recorded.push(outcome);
                            Ok(recorded)
                        }
                        Err(error) => Err(Halted { recorded, error }),
                    }
                },
            )
            .await;

        let (repetitions, aborted) = match folded {
            Ok(recorded) => (recorded, None),
            Err(Halted { error, .. }) if self.config.harness.strict => return Err(error),
            Err(Halted { recorded, error }) => (recorded, Some(error.to_string())),
        };

        Ok(BenchmarkOutcome {
            identifier: spec.identifier.clone(),
            iterations: spec.iterations,
            requested: spec.repetitions,
            repetitions,
            aborted,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Persist one repetition's result or its failure marker
    ///
    /// An error means the benchmark cannot continue: either the result could
    /// not be stored, or the run failed under strict mode.
    fn record(
        &self,
        store: &ResultStore,
        spec: &RunSpec,
        repetition: u32,
        result: Result<CapturedResult>,
    ) -> Result<RepetitionOutcome> {
        let stored = match result {
            Ok(captured) => store
                .put(&spec.identifier, repetition, &captured.payload)
                .map(|path| RepetitionOutcome::Stored {
                    repetition,
                    path,
                    bytes: captured.payload.len(),
                    duration_ms: captured.duration.as_millis() as u64,
                }),
            Err(run_error) => {
                warn!(
                    repetition,
                    error = %run_error,
                    "Repetition of {} failed",
                    spec.identifier
                );
                if self.config.harness.strict {
                    return Err(run_error);
                }
                let message = run_error.to_string();
                store
                    .record_failure(&spec.identifier, repetition, &message)
                    .map(|_| RepetitionOutcome::Failed {
                        repetition,
                        error: message,
                    })
            }
        };

        stored.inspect_err(|storage_error| {
            error!(
                repetition,
                error = %storage_error,
                "Cannot store results for {}, skipping its remaining repetitions",
                spec.identifier
            )
        })
    }
}

/// Outcomes recorded before a benchmark had to stop, and the reason
struct Halted {
    recorded: Vec<RepetitionOutcome>,
    error: HarnessError,
}

fn absolute(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    env::current_dir()
        .map(|cwd| cwd.join(root))
        .map_err(|e| HarnessError::Config(format!("cannot determine working directory: {}", e)))
}
