//! Shared fixtures: a throwaway project tree and a scripted process runner

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use suite_harness::{Config, Invocation, PathResolver, ProcessOutput, ProcessRunner};
use tempfile::TempDir;

type Script = Box<dyn Fn(&Invocation, usize) -> io::Result<ProcessOutput> + Send + Sync>;

/// Records every invocation and answers from a script
///
/// The script receives the invocation and the number of runtime launches
/// seen before it (build launches are not counted).
pub struct ScriptedRunner {
    build: ProcessOutput,
    script: Script,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&Invocation, usize) -> io::Result<ProcessOutput> + Send + Sync + 'static,
    {
        Self {
            build: ProcessOutput::ok("[success] Total time: 1 s"),
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every runtime launch succeeds and prints `<identifier> <launch>`
    pub fn echo() -> Self {
        Self::new(|invocation, launch| {
            Ok(ProcessOutput::ok(format!(
                "{} {}\n",
                benchmark_of(invocation),
                launch
            )))
        })
    }

    pub fn with_build(mut self, build: ProcessOutput) -> Self {
        self.build = build;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn runtime_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|invocation| !is_build(invocation))
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn execute(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let launch = self.runtime_calls().len();
        self.calls.lock().unwrap().push(invocation.clone());
        if is_build(invocation) {
            Ok(self.build.clone())
        } else {
            (self.script)(invocation, launch)
        }
    }
}

fn is_build(invocation: &Invocation) -> bool {
    invocation.program.file_name().and_then(|n| n.to_str()) == Some("sbt")
}

/// Benchmark identifier positional argument of a runtime invocation
pub fn benchmark_of(invocation: &Invocation) -> &str {
    let len = invocation.args.len();
    &invocation.args[len - 4]
}

/// A project directory with fake `sbt` and `java` on a private search path
pub struct Project {
    pub dir: TempDir,
    pub bin: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("sbt"), "").unwrap();
        fs::write(bin.join("java"), "").unwrap();
        Self { dir, bin }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn results(&self) -> PathBuf {
        self.root().join("results")
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(vec![self.bin.clone()])
    }

    /// Parse `toml` and anchor it at this project
    pub fn config(&self, toml: &str) -> Config {
        let mut config = Config::from_str(toml).unwrap();
        config.harness.project_root = self.root().to_path_buf();
        config
    }

    pub fn preset(&self, name: &str) -> Config {
        let mut config = Config::preset(name).unwrap();
        config.harness.project_root = self.root().to_path_buf();
        config
    }

    pub fn write_io(&self, identifier: &str, input: &str, output: &str) {
        let input_dir = self.root().join("input");
        let output_dir = self.root().join("output");
        fs::create_dir_all(&input_dir).unwrap();
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(input_dir.join(identifier), input).unwrap();
        fs::write(output_dir.join(identifier), output).unwrap();
    }
}

/// Sorted file names in `dir`
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
