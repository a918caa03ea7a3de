//! Results tree
//!
//! Layout:
//!
//! ```text
//! <results_root>/<identifier>/<repetition>          captured stdout
//! <results_root>/<identifier>/<repetition>.failed   diagnostic for a failed repetition
//! ```
//!
//! Writes go to a hidden temporary file first and are renamed into place, so
//! a result file is either absent or holds the complete payload.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HarnessError, Result};

const FAILURE_SUFFIX: &str = "failed";

/// Persists captured results under a deterministic path
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn benchmark_dir(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    pub fn result_path(&self, identifier: &str, repetition: u32) -> PathBuf {
        self.benchmark_dir(identifier).join(repetition.to_string())
    }

    pub fn failure_path(&self, identifier: &str, repetition: u32) -> PathBuf {
        self.benchmark_dir(identifier)
            .join(format!("{}.{}", repetition, FAILURE_SUFFIX))
    }

    /// Store `payload` as the current result for `(identifier, repetition)`
    ///
    /// Creates missing directories, replaces any previous result for the same
    /// index and clears a stale failure marker. Returns the written path.
    pub fn put(&self, identifier: &str, repetition: u32, payload: &[u8]) -> Result<PathBuf> {
        let dir = self.ensure_dir(identifier)?;
        let path = self.result_path(identifier, repetition);

        write_atomic(&dir, &path, payload)?;
        remove_if_present(&self.failure_path(identifier, repetition))?;

        debug!(path = %path.display(), bytes = payload.len(), "stored result");
        Ok(path)
    }

    /// Record that `(identifier, repetition)` produced no result
    ///
    /// Any earlier result for that index is removed so the tree never shows a
    /// payload from a previous harness run as if it were current.
    pub fn record_failure(
        &self,
        identifier: &str,
        repetition: u32,
        message: &str,
    ) -> Result<PathBuf> {
        let dir = self.ensure_dir(identifier)?;
        let path = self.failure_path(identifier, repetition);

        write_atomic(&dir, &path, message.as_bytes())?;
        remove_if_present(&self.result_path(identifier, repetition))?;
        Ok(path)
    }

    /// `create_dir_all`, where an existing directory is success and an
    /// existing non-directory is a storage failure
    fn ensure_dir(&self, identifier: &str) -> Result<PathBuf> {
        let dir = self.benchmark_dir(identifier);
        match fs::create_dir_all(&dir) {
            Ok(()) => Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(dir),
            Err(e) => Err(HarnessError::storage(dir, e)),
        }
    }
}

fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = dir.join(format!(".{}.tmp", file_name));

    let written = fs::write(&staging, contents).and_then(|()| fs::rename(&staging, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(HarnessError::storage(path, e));
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::storage(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_put_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results/nightly"));

        let path = store.put("bounce.BounceBenchmark", 0, b"12\n13\n").unwrap();
        assert_eq!(path, dir.path().join("results/nightly/bounce.BounceBenchmark/0"));
        assert_eq!(fs::read_to_string(path).unwrap(), "12\n13\n");
    }

    #[test]
    fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        store.put("cd.CDBenchmark", 4, b"42\n").unwrap();
        let once = listing(&store.benchmark_dir("cd.CDBenchmark"));
        store.put("cd.CDBenchmark", 4, b"42\n").unwrap();
        let twice = listing(&store.benchmark_dir("cd.CDBenchmark"));

        assert_eq!(once, twice);
        assert_eq!(once, vec!["4".to_string()]);
        assert_eq!(
            fs::read_to_string(store.result_path("cd.CDBenchmark", 4)).unwrap(),
            "42\n"
        );
    }

    #[test]
    fn test_put_overwrites_without_residue() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        store
            .put("json.JsonBenchmark", 0, b"a much longer first payload\n")
            .unwrap();
        store.put("json.JsonBenchmark", 0, b"short").unwrap();

        assert_eq!(
            fs::read_to_string(store.result_path("json.JsonBenchmark", 0)).unwrap(),
            "short"
        );
    }

    #[test]
    fn test_non_directory_collision_is_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("queens.QueensBenchmark"), "not a dir").unwrap();
        let store = ResultStore::new(dir.path());

        let err = store.put("queens.QueensBenchmark", 0, b"1").unwrap_err();
        assert!(matches!(err, HarnessError::Storage { .. }));
    }

    #[test]
    fn test_failure_marker_replaces_stale_result_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let bench_dir = store.benchmark_dir("tracer.TracerBenchmark");

        store.put("tracer.TracerBenchmark", 2, b"old").unwrap();
        store
            .record_failure("tracer.TracerBenchmark", 2, "exit code 1")
            .unwrap();
        assert_eq!(listing(&bench_dir), vec!["2.failed".to_string()]);

        store.put("tracer.TracerBenchmark", 2, b"new").unwrap();
        assert_eq!(listing(&bench_dir), vec!["2".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_stdout_is_stored_byte_for_byte() {
        use crate::process::{Invocation, ProcessRunner, SystemProcessRunner};

        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let invocation = Invocation::new("/bin/sh").args(["-c", r"printf 'a\377b'"]);
        let output = SystemProcessRunner.execute(&invocation).await.unwrap();

        let path = store.put("richards.RichardsBenchmark", 0, &output.stdout).unwrap();
        assert_eq!(fs::read(path).unwrap(), vec![b'a', 0xff, b'b']);
    }

    #[test]
    fn test_failed_rename_keeps_earlier_results_and_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let bench_dir = store.benchmark_dir("deltablue.DeltaBlueBenchmark");

        store.put("deltablue.DeltaBlueBenchmark", 0, b"complete\n").unwrap();
        fs::create_dir(bench_dir.join("1")).unwrap();

        let err = store
            .put("deltablue.DeltaBlueBenchmark", 1, b"never lands")
            .unwrap_err();
        assert!(matches!(err, HarnessError::Storage { .. }));
        assert_eq!(listing(&bench_dir), vec!["0".to_string(), "1".to_string()]);
        assert_eq!(fs::read(bench_dir.join("0")).unwrap(), b"complete\n");
        assert!(bench_dir.join("1").is_dir());
    }

    #[test]
    fn test_no_staging_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        for repetition in 0..3 {
            store.put("permute.PermuteBenchmark", repetition, b"x").unwrap();
        }
        assert_eq!(
            listing(&store.benchmark_dir("permute.PermuteBenchmark")),
            vec!["0".to_string(), "1".to_string(), "2".to_string()]
        );
    }
}
