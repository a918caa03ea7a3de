//! Configuration parsing for benchmark suites
//!
//! This module provides TOML-based configuration describing the toolchain pin,
//! how the build tool and runtime are invoked, and which benchmarks make up a
//! suite. A configuration is an immutable value handed to the orchestrator, so
//! several suites (a smoke suite, the full suite) can coexist in one process.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

const FULL_PRESET: &str = include_str!("../suites/full.toml");
const BOUNCE_PRESET: &str = include_str!("../suites/bounce.toml");

/// Names accepted by [`Config::preset`]
pub const PRESETS: &[&str] = &["full", "bounce"];

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Toolchain version pin written before every build
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Build tool, runtime and storage settings
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Benchmarks to execute
    pub suite: SuiteConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - The suite fails validation
    ///
    /// # Example
    ///
    /// ```no_run
    /// use suite_harness::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("suite.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use suite_harness::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [suite]
    ///     benchmarks = ["bounce.BounceBenchmark"]
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.suite.repetitions, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load one of the bundled suites (see [`PRESETS`])
    pub fn preset(name: &str) -> anyhow::Result<Self> {
        let source = match name {
            "full" => FULL_PRESET,
            "bounce" => BOUNCE_PRESET,
            other => anyhow::bail!(
                "Unknown preset '{}' (expected one of: {})",
                other,
                PRESETS.join(", ")
            ),
        };
        Self::from_str(source).with_context(|| format!("Bundled preset '{}' is invalid", name))
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.suite.benchmarks.is_empty() {
            return Err(HarnessError::Config("suite has no benchmarks".to_string()));
        }
        if self.suite.iterations == 0 {
            return Err(HarnessError::Config(
                "suite iterations must be positive".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.suite.benchmarks {
            let identifier = entry.identifier();
            if identifier.trim().is_empty() {
                return Err(HarnessError::Config(
                    "benchmark identifier must not be empty".to_string(),
                ));
            }
            if identifier.trim() != identifier {
                return Err(HarnessError::Config(format!(
                    "benchmark identifier '{}' has surrounding whitespace",
                    identifier
                )));
            }
            if identifier.contains('/')
                || identifier.contains('\\')
                || identifier == "."
                || identifier == ".."
            {
                return Err(HarnessError::Config(format!(
                    "benchmark identifier '{}' is not a valid directory name",
                    identifier
                )));
            }
            if !seen.insert(identifier) {
                return Err(HarnessError::Config(format!(
                    "duplicate benchmark identifier '{}'",
                    identifier
                )));
            }
            if let BenchmarkEntry::Inline(inline) = entry {
                if inline.iterations == Some(0) {
                    return Err(HarnessError::Config(format!(
                        "iterations for '{}' must be positive",
                        identifier
                    )));
                }
            }
        }

        if self.harness.build_tool.is_empty() || self.harness.runtime.is_empty() {
            return Err(HarnessError::Config(
                "build_tool and runtime must be named".to_string(),
            ));
        }

        Ok(())
    }

    /// Location of the reproducibility declaration
    pub fn pin_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.toolchain.pin_file)
    }

    /// Root of the results tree
    pub fn results_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.harness.results_root)
    }

    /// Expand classpath templates into concrete locations, preserving order
    ///
    /// `{version}` and `{binary_version}` are substituted from the toolchain,
    /// a leading `~/` is replaced by `home`, and relative entries are anchored
    /// at `project_root`.
    pub fn resolve_classpath(&self, project_root: &Path, home: Option<&Path>) -> Vec<PathBuf> {
        self.harness
            .classpath
            .iter()
            .map(|entry| {
                let expanded = entry
                    .replace("{binary_version}", &self.toolchain.binary_version())
                    .replace("{version}", &self.toolchain.scala_version);

                let path = match (expanded.strip_prefix("~/"), home) {
                    (Some(rest), Some(home)) => home.join(rest),
                    _ => PathBuf::from(&expanded),
                };

                if path.is_absolute() {
                    path
                } else {
                    project_root.join(path)
                }
            })
            .collect()
    }
}

/// Toolchain version pin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Full Scala version, e.g. `2.11.12`
    #[serde(default = "default_scala_version")]
    pub scala_version: String,
    /// Project-relative file receiving the declaration
    #[serde(default = "default_pin_file")]
    pub pin_file: PathBuf,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            scala_version: default_scala_version(),
            pin_file: default_pin_file(),
        }
    }
}

impl ToolchainConfig {
    /// The major.minor binary version (`2.11.12` -> `2.11`)
    pub fn binary_version(&self) -> String {
        self.scala_version
            .split('.')
            .take(2)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The single declarative line written to the pin file
    pub fn declaration(&self) -> String {
        format!("scalaVersion := \"{}\"", self.scala_version)
    }
}

fn default_scala_version() -> String {
    "2.11.12".to_string()
}

fn default_pin_file() -> PathBuf {
    PathBuf::from("build.sbt")
}

/// How the external tools are located and invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Working directory for the build and base for relative paths
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Results tree, relative to the project root unless absolute
    #[serde(default = "default_results_root")]
    pub results_root: PathBuf,
    /// Build tool name or path (default: `sbt`)
    #[serde(default = "default_build_tool")]
    pub build_tool: String,
    /// Arguments passed to the build tool (default: `["compile"]`)
    #[serde(default = "default_build_args")]
    pub build_args: Vec<String>,
    /// Runtime name or path (default: `java`)
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Fixed flags placed before the classpath option
    #[serde(default = "default_runtime_flags")]
    pub runtime_flags: Vec<String>,
    /// Option introducing the joined classpath
    #[serde(default = "default_classpath_option")]
    pub classpath_option: String,
    /// Classpath templates, see [`Config::resolve_classpath`]
    #[serde(default = "default_classpath")]
    pub classpath: Vec<String>,
    /// Abort on the first failed repetition instead of continuing
    #[serde(default)]
    pub strict: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            results_root: default_results_root(),
            build_tool: default_build_tool(),
            build_args: default_build_args(),
            runtime: default_runtime(),
            runtime_flags: default_runtime_flags(),
            classpath_option: default_classpath_option(),
            classpath: default_classpath(),
            strict: false,
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_results_root() -> PathBuf {
    PathBuf::from("results")
}

fn default_build_tool() -> String {
    "sbt".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["compile".to_string()]
}

fn default_runtime() -> String {
    "java".to_string()
}

fn default_runtime_flags() -> Vec<String> {
    vec!["-Xms1024M".to_string(), "-Xmx1024M".to_string()]
}

fn default_classpath_option() -> String {
    "-classpath".to_string()
}

fn default_classpath() -> Vec<String> {
    vec![
        "target/scala-{binary_version}/classes".to_string(),
        "~/.ivy2/cache/org.scala-lang/scala-library/jars/scala-library-{version}.jar".to_string(),
    ]
}

/// The benchmark list and its shared parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Name of the suite, used in reports
    #[serde(default = "default_suite_name")]
    pub name: String,
    /// Iteration count passed to every benchmark (default: 1)
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Number of repetitions per benchmark (default: 1)
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,
    /// Directory holding `<identifier>` input files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory holding `<identifier>` expected-output files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Benchmarks in execution order
    pub benchmarks: Vec<BenchmarkEntry>,
}

fn default_suite_name() -> String {
    "benchmarks".to_string()
}

fn default_iterations() -> u32 {
    1
}

fn default_repetitions() -> u32 {
    1
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// One suite entry, either a bare identifier or a fully inline description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BenchmarkEntry {
    /// Input and expected output are read from the suite's input/output dirs
    Named(String),
    /// Everything is given in the configuration
    Inline(InlineBenchmark),
}

impl BenchmarkEntry {
    pub fn identifier(&self) -> &str {
        match self {
            BenchmarkEntry::Named(identifier) => identifier,
            BenchmarkEntry::Inline(inline) => &inline.identifier,
        }
    }
}

/// Inline benchmark definition with optional per-benchmark overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineBenchmark {
    pub identifier: String,
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub repetitions: Option<u32>,
}
