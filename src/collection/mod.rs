//! Log Collection - named training logs and cross-run queries
//!
//! A [`LogCollection`] owns an append-only list of [`Log`]s, each with a
//! name (usually its file path). Queries group runs by a derived basename
//! and aggregate their series.
//!
//! ## Usage
//!
//! ```rust
//! use trainlog::collection::{LogCollection, Selection};
//! use trainlog::log::Log;
//!
//! let mut run1 = Log::new();
//! for v in [0.1, 0.5, 0.3] {
//!     run1.push_value("dev", "acc", v);
//! }
//! let mut run2 = Log::new();
//! for v in [0.2, 0.4, 0.6] {
//!     run2.push_value("dev", "acc", v);
//! }
//!
//! let mut collection = LogCollection::new();
//! collection.add_log("modelA_1", run1);
//! collection.add_log("modelA_2", run2);
//!
//! let selection = Selection::new().basename(|name| name[..6].to_string());
//! let best = collection.find_highest_average("acc", &selection)?;
//! assert!((best["modelA"]["dev"] - 0.55).abs() < 1e-9);
//! # Ok::<(), trainlog::Error>(())
//! ```

mod aggregate;
mod charts;
mod selection;

use std::fs;
use std::path::Path;

use crate::log::Log;
use crate::Result;

pub use aggregate::{Grouped, RankedScore, Scores};
pub use selection::{accept_all, identity, Selection};

/// Derives a log name from `(file_path, containing_dir)`.
pub type NameDeriver<'f> = dyn Fn(&Path, &Path) -> String + 'f;

/// Ordered, named set of training logs.
#[derive(Debug, Clone, Default)]
pub struct LogCollection {
    logs: Vec<Log>,
    names: Vec<String>,
}

impl LogCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// True if no logs were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Log names, index-aligned with [`LogCollection::logs`].
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Logs, index-aligned with [`LogCollection::names`].
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// First log registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Log> {
        self.iter().find(|(n, _)| *n == name).map(|(_, log)| log)
    }

    /// `(name, log)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Log)> {
        self.names.iter().map(String::as_str).zip(&self.logs)
    }

    /// Append an already built log under `name`.
    pub fn add_log(&mut self, name: impl Into<String>, log: Log) {
        self.names.push(name.into());
        self.logs.push(log);
    }

    /// Load one log file and register it under its path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::ParseError` if the file cannot be
    /// loaded; the collection is unchanged in that case.
    pub fn add_log_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let log = Log::from_file(path)?;
        self.add_log(path.to_string_lossy(), log);
        Ok(())
    }

    /// Recursively load every file under `root` whose name ends with
    /// `extension` (`""` matches all files).
    ///
    /// Each log is named by `name_deriver(file_path, containing_dir)` when
    /// given, else by its path. Directory entries are visited in sorted
    /// order; symlinked directories are skipped. Returns the number
    /// of logs added.
    ///
    /// # Errors
    ///
    /// Stops at the first directory listing, read or parse failure. Logs
    /// loaded before the failure stay in the collection.
    pub fn add_log_from_directory<P: AsRef<Path>>(
        &mut self,
        root: P,
        extension: &str,
        name_deriver: Option<&NameDeriver<'_>>,
    ) -> Result<usize> {
        let root = root.as_ref();
        let before = self.len();
        self.walk(root, extension, name_deriver)?;
        let added = self.len() - before;
        tracing::info!(root = %root.display(), extension, added, "directory loaded");
        Ok(added)
    }

    fn walk(
        &mut self,
        dir: &Path,
        extension: &str,
        name_deriver: Option<&NameDeriver<'_>>,
    ) -> Result<()> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        for (path, file_type) in entries {
            if file_type.is_dir() {
                subdirs.push(path);
                continue;
            }
            // links to directories are skipped, not descended into
            if file_type.is_symlink() && path.is_dir() {
                tracing::debug!(path = %path.display(), "skipping directory symlink");
                continue;
            }
            if !path.to_string_lossy().ends_with(extension) {
                continue;
            }
            let name = match name_deriver {
                Some(derive) => derive(&path, dir),
                None => path.to_string_lossy().into_owned(),
            };
            let log = Log::from_file(&path)?;
            self.add_log(name, log);
        }

        for subdir in subdirs {
            self.walk(&subdir, extension, name_deriver)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_logs_stay_aligned() {
        let mut collection = LogCollection::new();
        let mut first = Log::new();
        first.record_step(1);
        collection.add_log("a", first);
        collection.add_log("b", Log::new());

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.names(), ["a", "b"]);
        assert_eq!(collection.get("a").unwrap().get_steps(), &[1]);
        assert!(collection.get("missing").is_none());
    }

    #[test]
    fn test_failed_file_load_adds_nothing() {
        let mut collection = LogCollection::new();
        let result = collection.add_log_from_file("/nonexistent/trainlog/run.log");
        assert!(result.is_err());
        assert!(collection.is_empty());
    }
}
