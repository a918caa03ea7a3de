//! Executable lookup on a search path

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolves executable names the way a shell resolves `PATH`
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    search_path: Vec<PathBuf>,
}

impl PathResolver {
    /// Resolver over an explicit, ordered directory list
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Resolver over the process `PATH`
    pub fn from_env() -> Self {
        env::var_os("PATH")
            .map(|path| Self::from_search_path(&path))
            .unwrap_or_default()
    }

    /// Split a platform-separated search path. Empty segments are dropped.
    pub fn from_search_path(search_path: &OsStr) -> Self {
        Self::new(
            env::split_paths(search_path)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect(),
        )
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Locate `name`
    ///
    /// Returns `name` unchanged when it already points at a regular file,
    /// otherwise the first `dir/name` that is a regular file. `None` means
    /// not found; callers decide whether that is fatal.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let literal = Path::new(name);
        if literal.is_file() {
            return Some(literal.to_path_buf());
        }

        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}
