//! Network legs of a sync, run through the system git executable
//!
//! System git is used rather than libgit2 transports so the user's own git
//! installation (proxies, TLS settings, SSH agent) applies unchanged.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::core::error_handler::{transport_error, Operation};
use crate::error::{FailureKind, PackSyncError, Result};

/// Pull and push against a named remote
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Fast-forward the current branch from `remote`
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push `branch` to the same-named branch on `remote`
    fn push(&self, remote: &str, branch: &str) -> Result<()>;
}

/// [`Transport`] backed by the `git` command line
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Run git inside the given working copy
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, operation: Operation, remote: &str, args: &[&str]) -> Result<()> {
        debug!(operation = operation.as_str(), remote, "running git");

        let output = Command::new("git")
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(args)
            .output()
            .map_err(|e| {
                let detail = format!("Failed to execute git {}: {}", operation.as_str(), e);
                match operation {
                    Operation::Pull => PackSyncError::PullFailed {
                        remote: remote.to_string(),
                        kind: FailureKind::Other,
                        detail,
                    },
                    Operation::Push => PackSyncError::PushFailed {
                        remote: remote.to_string(),
                        kind: FailureKind::Other,
                        detail,
                    },
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(transport_error(operation, remote, &stderr));
        }

        Ok(())
    }
}

impl Transport for GitCli {
    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(
            Operation::Pull,
            remote,
            &["pull", "--ff-only", remote, branch],
        )
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("{}:{}", branch, branch);
        self.run(Operation::Push, remote, &["push", remote, &refspec])
    }
}
