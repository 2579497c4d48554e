//! Working copy change detection scoped to the pack directory

use crate::core::git::{FileStatus, GitRepository};
use crate::error::Result;

/// Snapshot of every changed path in the working copy
///
/// Taken once per run; nothing here touches the repository after the scan.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    files: Vec<FileStatus>,
}

impl ChangeSet {
    /// Scan modified, deleted, staged and untracked paths
    pub fn scan(repo: &GitRepository) -> Result<Self> {
        Ok(Self {
            files: repo.changed_files()?,
        })
    }

    /// True when no path in the working copy differs from HEAD
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths under `subtree`, in scan order
    pub fn scoped_changes(&self, subtree: &str) -> Vec<String> {
        self.scoped_files(subtree)
            .map(|file| file.path.clone())
            .collect()
    }

    /// Entries under `subtree`
    pub fn scoped_files<'a>(&'a self, subtree: &'a str) -> impl Iterator<Item = &'a FileStatus> {
        self.files
            .iter()
            .filter(move |file| in_subtree(&file.path, subtree))
    }

    /// Entries outside `subtree`
    pub fn unscoped_files<'a>(
        &'a self,
        subtree: &'a str,
    ) -> impl Iterator<Item = &'a FileStatus> {
        self.files
            .iter()
            .filter(move |file| !in_subtree(&file.path, subtree))
    }

    /// All changed entries
    pub fn files(&self) -> &[FileStatus] {
        &self.files
    }
}

/// Whether the first segment of a repository-relative path is `subtree`
pub fn in_subtree(path: &str, subtree: &str) -> bool {
    path.split('/').next() == Some(subtree)
}
