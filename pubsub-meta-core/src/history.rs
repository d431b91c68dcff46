//! Per-kind recents files.
//!
//! Each resource kind gets one flat file under the history directory,
//! one fully-qualified name per line, oldest first. Saving moves a
//! name to the end, so the last line is always the most recent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Topic,
    Subscription,
}

impl ResourceKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Subscription => "subscription",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::Subscription => "Subscription",
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads and rewrites the recents files. Files are small; every save
/// rewrites the whole file.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// All remembered names for `kind`, oldest first. Blank lines are
    /// skipped.
    pub fn list(&self, kind: ResourceKind) -> Result<Vec<String>, HistoryError> {
        let path = self.path(kind);
        let raw = fs::read_to_string(&path).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Appends `name` as the newest entry, removing any earlier
    /// occurrence first so each name appears at most once.
    pub fn save(&self, kind: ResourceKind, name: &str) -> Result<(), HistoryError> {
        let mut entries = self.list(kind)?;
        entries.retain(|entry| entry != name);
        entries.push(name.to_string());

        let path = self.path(kind);
        let mut body = entries.join("\n");
        body.push('\n');
        fs::write(&path, body).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(kind = kind.label(), name, "history updated");
        Ok(())
    }

    /// Most recently saved name for `kind`, if any.
    pub fn last(&self, kind: ResourceKind) -> Result<Option<String>, HistoryError> {
        Ok(self.list(kind)?.pop())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
