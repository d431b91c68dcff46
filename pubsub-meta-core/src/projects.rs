//! Local project roster.
//!
//! Project listing against the remote directory is slow, so the
//! dashboard never does it inline. A `fetch-projects` run writes the
//! roster file once; the pick-one flow reads it back instantly.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::directory::{DirectoryError, ProjectDirectory};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Remote(#[from] DirectoryError),
}

pub struct ProjectRoster {
    path: PathBuf,
}

impl ProjectRoster {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Project ids from the local roster file, one per line.
    pub fn list(&self) -> Result<Vec<String>, RosterError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| RosterError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Queries the remote directory and rewrites the roster file.
    /// System-reserved `sys-` projects are dropped and the remainder
    /// sorted. Returns how many ids were written.
    pub async fn fetch(&self, directory: &dyn ProjectDirectory) -> Result<usize, RosterError> {
        let mut ids: Vec<String> = directory
            .search_projects()
            .await?
            .into_iter()
            .filter(|id| !id.starts_with("sys-"))
            .collect();
        ids.sort();

        let mut body = ids.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(&self.path, body).map_err(|source| RosterError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(count = ids.len(), path = %self.path.display(), "project roster refreshed");
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCloud;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let roster = ProjectRoster::new(dir.path().join("projects"));
        let cloud = FakeCloud::empty().with_projects(vec![
            "zebra-prod".into(),
            "sys-internal".into(),
            "acme-prod".into(),
        ]);

        let count = roster.fetch(&cloud).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(roster.list().unwrap(), vec!["acme-prod", "zebra-prod"]);
    }

    #[tokio::test]
    async fn test_fetch_overwrites_previous_roster() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects");
        fs::write(&path, "stale-project\n").unwrap();
        let roster = ProjectRoster::new(path);
        let cloud = FakeCloud::empty().with_projects(vec!["fresh-project".into()]);

        roster.fetch(&cloud).await.unwrap();
        assert_eq!(roster.list().unwrap(), vec!["fresh-project"]);
    }

    #[test]
    fn test_list_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let roster = ProjectRoster::new(dir.path().join("projects"));
        assert!(matches!(roster.list(), Err(RosterError::Io { .. })));
    }
}
