//! Build step
//!
//! Writes the toolchain pin and runs the external build tool once, before any
//! benchmark executes.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::config::ToolchainConfig;
use crate::error::{HarnessError, Result};
use crate::process::{Invocation, ProcessRunner};

/// Persist the reproducibility declaration, overwriting any previous one
pub fn write_pin(toolchain: &ToolchainConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::storage(parent, e))?;
    }
    fs::write(path, toolchain.declaration()).map_err(|e| HarnessError::storage(path, e))?;
    info!("Pinned toolchain in {}: {}", path.display(), toolchain.declaration());
    Ok(())
}

/// Runs `<build_tool> <build_args...>` in the project root
#[derive(Debug, Clone)]
pub struct BuildInvoker {
    build_tool: PathBuf,
    build_args: Vec<String>,
    project_root: PathBuf,
}

impl BuildInvoker {
    pub fn new(build_tool: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            build_tool: build_tool.into(),
            build_args: vec!["compile".to_string()],
            project_root: project_root.into(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.build_args = args;
        self
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.build_tool)
            .args(self.build_args.iter().cloned())
            .current_dir(&self.project_root)
    }

    /// Run the build to completion
    ///
    /// Returns the captured standard output on success. A non-zero exit is a
    /// [`HarnessError::Build`] carrying the captured standard error, and a
    /// tool that cannot be launched is reported the same way.
    #[instrument(skip_all, fields(tool = %self.build_tool.display()))]
    pub async fn build(&self, processes: &dyn ProcessRunner) -> Result<String> {
        let invocation = self.invocation();
        info!(">>> {}", invocation);

        let output = processes
            .execute(&invocation)
            .await
            .map_err(|e| HarnessError::Build {
                status: "failed to launch".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.success {
            return Err(HarnessError::Build {
                status: output.status_description(),
                stderr: output.stderr,
            });
        }

        info!("Build finished");
        Ok(output.stdout_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;

    struct Canned {
        output: ProcessOutput,
        seen: Mutex<Vec<Invocation>>,
    }

    #[async_trait]
    impl ProcessRunner for Canned {
        async fn execute(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
            self.seen.lock().unwrap().push(invocation.clone());
            Ok(self.output.clone())
        }
    }

    #[test]
    fn test_write_pin_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.sbt");
        fs::write(&path, "scalaVersion := \"2.10.0\"\nlibraryDependencies += junk\n").unwrap();

        write_pin(&ToolchainConfig::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "scalaVersion := \"2.11.12\"");
    }

    #[tokio::test]
    async fn test_build_success_returns_stdout() {
        let runner = Canned {
            output: ProcessOutput::ok("[success] Total time: 3 s"),
            seen: Mutex::new(Vec::new()),
        };
        let invoker = BuildInvoker::new("/usr/bin/sbt", "/work");

        let stdout = invoker.build(&runner).await.unwrap();
        assert!(stdout.contains("success"));

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, PathBuf::from("/usr/bin/sbt"));
        assert_eq!(seen[0].args, vec!["compile".to_string()]);
        assert_eq!(seen[0].current_dir, Some(PathBuf::from("/work")));
    }

    #[tokio::test]
    async fn test_build_failure_carries_stderr() {
        let runner = Canned {
            output: ProcessOutput::failed(1, "[error] type mismatch"),
            seen: Mutex::new(Vec::new()),
        };
        let invoker = BuildInvoker::new("sbt", ".");

        match invoker.build(&runner).await {
            Err(HarnessError::Build { status, stderr }) => {
                assert_eq!(status, "exit code 1");
                assert!(stderr.contains("type mismatch"));
            }
            other => panic!("Expected build failure, got {:?}", other),
        }
    }
}
