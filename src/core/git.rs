//! Local git repository operations
//!
//! This module provides a wrapper around git2 for the operations a sync needs:
//! - Repository discovery and validation
//! - Branch and remote URL lookup
//! - Working copy status
//! - Staging and committing a single directory

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository, Signature, StatusOptions};
use serde::Serialize;

use crate::error::{PackSyncError, Result};

/// Wrapper for local git repository operations
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the git repository in the current directory
    pub fn open_current_dir() -> Result<Self> {
        Self::discover(".")
    }

    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| PackSyncError::NotGitRepository)?;
        Ok(Self { repo })
    }

    /// Check if the current directory is a git repository
    pub fn is_git_repository() -> bool {
        Repository::discover(".").is_ok()
    }

    /// Get the current branch name
    ///
    /// On an unborn branch (no commits yet) this is the branch the first
    /// commit will create.
    pub fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(str::to_string)
                .ok_or(PackSyncError::DetachedHead),
            Ok(_) => Err(PackSyncError::DetachedHead),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or(PackSyncError::DetachedHead)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the URL persisted for a remote
    pub fn remote_url(&self, remote_name: &str) -> Result<String> {
        let remote = self.repo.find_remote(remote_name).map_err(|e| {
            if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec {
                PackSyncError::RemoteNotFound(remote_name.to_string())
            } else {
                e.into()
            }
        })?;

        remote.url().map(|s| s.to_string()).ok_or_else(|| {
            PackSyncError::Config(format!(
                "The URL of remote '{}' is not valid UTF-8",
                remote_name
            ))
        })
    }

    /// Overwrite the URL persisted for a remote
    pub fn set_remote_url(&self, remote_name: &str, url: &str) -> Result<()> {
        self.repo.remote_set_url(remote_name, url)?;
        Ok(())
    }

    /// Get list of files with changes, including untracked files
    pub fn changed_files(&self) -> Result<Vec<FileStatus>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);
        opts.include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut files = Vec::new();

        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_ignored() || status == git2::Status::CURRENT {
                continue;
            }

            if let Some(path) = entry.path() {
                files.push(FileStatus {
                    path: path.to_string(),
                    is_staged: status.intersects(
                        git2::Status::INDEX_NEW
                            | git2::Status::INDEX_MODIFIED
                            | git2::Status::INDEX_DELETED
                            | git2::Status::INDEX_RENAMED
                            | git2::Status::INDEX_TYPECHANGE,
                    ),
                    is_modified: status.intersects(
                        git2::Status::WT_MODIFIED
                            | git2::Status::WT_DELETED
                            | git2::Status::WT_RENAMED
                            | git2::Status::WT_TYPECHANGE,
                    ),
                    is_new: status.contains(git2::Status::WT_NEW),
                    is_deleted: status
                        .intersects(git2::Status::WT_DELETED | git2::Status::INDEX_DELETED),
                });
            }
        }

        Ok(files)
    }

    /// Stage everything under a top-level directory, deletions included
    ///
    /// Paths are staged literally, so directory names containing glob
    /// characters such as `[` or `*` match only themselves.
    pub fn stage_directory(&self, dir: &str) -> Result<()> {
        let workdir = self.root_dir()?;
        let prefix = format!("{}/", dir);
        let changed = self.changed_files()?;

        let mut index = self.repo.index()?;
        index.read(false)?;

        for file in changed {
            if !file.path.starts_with(&prefix) {
                continue;
            }
            let path = Path::new(&file.path);
            if workdir.join(path).symlink_metadata().is_ok() {
                index.add_path(path)?;
            } else {
                index.remove_path(path)?;
            }
        }

        index.write()?;
        Ok(())
    }

    /// Commit the staged state of a top-level directory, and nothing else
    ///
    /// The new tree is HEAD's tree with only the `dir` entry taken from the
    /// index, so changes staged elsewhere stay staged and out of the commit.
    /// Returns the new commit id.
    pub fn commit_directory(&self, dir: &str, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        let staged_tree = self.repo.find_tree(index.write_tree()?)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let base_tree = parent.as_ref().map(|commit| commit.tree()).transpose()?;

        let mut builder = self.repo.treebuilder(base_tree.as_ref())?;
        match staged_tree.get_name(dir) {
            Some(entry) => {
                builder.insert(dir, entry.id(), entry.filemode())?;
            }
            None => {
                if builder.get(dir)?.is_some() {
                    builder.remove(dir)?;
                }
            }
        }
        let tree_id = builder.write()?;
        let tree = self.repo.find_tree(tree_id)?;

        let unchanged = match &base_tree {
            Some(base) => base.id() == tree_id,
            None => tree.is_empty(),
        };
        if unchanged {
            return Err(PackSyncError::NothingToCommit(dir.to_string()));
        }

        let signature = self.repo.signature().or_else(|_| {
            // Fallback signature if not configured
            Signature::now("pack-sync", "pack-sync@localhost")
        })?;

        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let commit_id = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        Ok(commit_id.to_string())
    }

    /// Get the repository root directory
    pub fn root_dir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(|p| p.to_path_buf())
            .ok_or(PackSyncError::NotGitRepository)
    }

    /// Get ahead/behind count of a branch relative to its remote-tracking ref
    ///
    /// Returns `None` when the remote-tracking ref does not exist.
    pub fn branch_status(&self, remote: &str, branch: &str) -> Result<Option<(usize, usize)>> {
        let local_ref = format!("refs/heads/{}", branch);
        let local_oid = match self.repo.revparse_single(&local_ref) {
            Ok(obj) => obj.id(),
            Err(_) => return Ok(None),
        };

        let remote_ref = format!("refs/remotes/{}/{}", remote, branch);
        let remote_oid = match self.repo.revparse_single(&remote_ref) {
            Ok(obj) => obj.id(),
            Err(_) => return Ok(None), // No tracking branch
        };

        let (ahead, behind) = self.repo.graph_ahead_behind(local_oid, remote_oid)?;
        Ok(Some((ahead, behind)))
    }
}

/// Status of a file in the working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// File path relative to repository root
    pub path: String,
    /// Whether the file is staged for commit
    pub is_staged: bool,
    /// Whether the file has unstaged modifications
    pub is_modified: bool,
    /// Whether this is a new untracked file
    pub is_new: bool,
    /// Whether the file has been deleted
    pub is_deleted: bool,
}

impl FileStatus {
    /// Get a status indicator character
    pub fn status_char(&self) -> char {
        if self.is_deleted {
            'D'
        } else if self.is_new {
            '?'
        } else if self.is_modified || self.is_staged {
            'M'
        } else {
            ' '
        }
    }
}
