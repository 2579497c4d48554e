//! Custom error types for pack-sync
//!
//! User-friendly error messages for all failure scenarios, plus the
//! classification the sync run uses to decide whether it can keep going.

use thiserror::Error;

/// How a failure affects the current sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Setup problem detected before anything was mutated
    Configuration,
    /// Network failure the run continues past (pull)
    RecoverableNetwork,
    /// Network failure that ends the run (push)
    FatalNetwork,
    /// Local repository state prevented the commit
    LocalState,
}

/// What went wrong during a pull or push, as read from git's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote refused the update (non-fast-forward)
    Rejected,
    /// The token was refused
    Authentication,
    /// The remote could not be reached
    Unreachable,
    /// Local and remote histories diverged
    Diverged,
    /// The branch does not exist on the remote
    MissingBranch,
    /// Anything git reported that we do not recognise
    Other,
}

impl FailureKind {
    /// Actionable guidance appended to the error message
    pub fn hint(&self) -> &'static str {
        match self {
            FailureKind::Rejected => {
                "\n\n  → The remote has commits you don't have yet.\n  → Pull and resolve the differences manually, then push again."
            }
            FailureKind::Authentication => {
                "\n\n  → Your token may be invalid, expired, or missing the 'repo' scope.\n  → Run 'pack-sync auth logout' then 'pack-sync auth login' to enter a new one."
            }
            FailureKind::Unreachable => {
                "\n\n  → Check your internet connection.\n  → Run 'git remote -v' to check the remote URL."
            }
            FailureKind::Diverged => {
                "\n\n  → Your branch and the remote have diverged.\n  → pack-sync does not merge histories; resolve this with git directly."
            }
            FailureKind::MissingBranch => "\n\n  → The branch does not exist on the remote yet.",
            FailureKind::Other => "",
        }
    }
}

/// Main error type for pack-sync
#[derive(Error, Debug)]
pub enum PackSyncError {
    /// Not running in a git repository
    #[error("This directory is not a git repository.\n\n  → Run pack-sync from inside your project's working copy.")]
    NotGitRepository,

    /// The named remote is not configured
    #[error("No remote named '{0}' is configured.\n\n  → Run 'git remote -v' to check your remotes.\n  → Example: git remote add {0} https://github.com/user/repo.git")]
    RemoteNotFound(String),

    /// HEAD does not point at a branch
    #[error("HEAD is detached, so there is no branch to sync.\n\n  → Run 'git checkout <branch>' and try again.")]
    DetachedHead,

    /// No token stored and none entered
    #[error("No GitHub token is available.\n\n  → Run 'pack-sync auth login' to store one.\n  → Or set the GITHUB_TOKEN environment variable.")]
    NotAuthenticated,

    /// Pack directory name is not a single top-level directory
    #[error("Invalid pack directory '{0}'.\n\n  → Use a single directory name at the repository root, e.g. 'pack'.")]
    InvalidPackDir(String),

    /// Pull failed; the run carries on without it
    #[error("Pulling from '{remote}' failed: {detail}{}", .kind.hint())]
    PullFailed {
        remote: String,
        kind: FailureKind,
        detail: String,
    },

    /// Push failed; the run stops here
    #[error("Pushing to '{remote}' failed: {detail}{}", .kind.hint())]
    PushFailed {
        remote: String,
        kind: FailureKind,
        detail: String,
    },

    /// Staging or committing the pack failed
    #[error("Could not commit the pack: {0}")]
    CommitFailed(String),

    /// Changes were detected but nothing under the pack differs from HEAD
    #[error("Nothing to commit under '{0}' even though changes were reported.\n\n  → Run 'git status' to inspect the working copy.")]
    NothingToCommit(String),

    /// Git operation error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

impl PackSyncError {
    /// Classify this error for the sync run
    pub fn class(&self) -> ErrorClass {
        match self {
            PackSyncError::PullFailed { .. } => ErrorClass::RecoverableNetwork,
            PackSyncError::PushFailed { .. } => ErrorClass::FatalNetwork,
            PackSyncError::CommitFailed(_)
            | PackSyncError::NothingToCommit(_)
            | PackSyncError::Git(_) => ErrorClass::LocalState,
            PackSyncError::NotGitRepository
            | PackSyncError::RemoteNotFound(_)
            | PackSyncError::DetachedHead
            | PackSyncError::NotAuthenticated
            | PackSyncError::InvalidPackDir(_)
            | PackSyncError::Config(_)
            | PackSyncError::Io(_)
            | PackSyncError::Json(_)
            | PackSyncError::Toml(_)
            | PackSyncError::InvalidInput(_) => ErrorClass::Configuration,
        }
    }

    /// Replace every occurrence of `secret` in the error's free-text detail
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        let scrub = |text: String| text.replace(secret, "***");

        match self {
            PackSyncError::PullFailed {
                remote,
                kind,
                detail,
            } => PackSyncError::PullFailed {
                remote: scrub(remote),
                kind,
                detail: scrub(detail),
            },
            PackSyncError::PushFailed {
                remote,
                kind,
                detail,
            } => PackSyncError::PushFailed {
                remote: scrub(remote),
                kind,
                detail: scrub(detail),
            },
            PackSyncError::CommitFailed(msg) => PackSyncError::CommitFailed(scrub(msg)),
            PackSyncError::Config(msg) => PackSyncError::Config(scrub(msg)),
            other => other,
        }
    }
}

impl From<toml::de::Error> for PackSyncError {
    fn from(err: toml::de::Error) -> Self {
        PackSyncError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for PackSyncError {
    fn from(err: toml::ser::Error) -> Self {
        PackSyncError::Toml(err.to_string())
    }
}

/// Result type alias using PackSyncError
pub type Result<T> = std::result::Result<T, PackSyncError>;
