//! Git transport error detection and classification
//!
//! Reads the stderr of a failed `git pull` / `git push` to tell the user
//! whether the token, the network, or the history is at fault.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FailureKind, PackSyncError};

static AUTH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)authentication failed|could not read (username|password)|invalid username or password|permission to .+ denied|returned error: 40[13]|terminal prompts disabled",
    )
    .expect("Invalid regex pattern for authentication failures")
});

static REJECTED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[rejected\]|\[remote rejected\]|non-fast-forward|fetch first")
        .expect("Invalid regex pattern for rejected pushes")
});

static DIVERGED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)not possible to fast-forward|divergent branches|have diverged")
        .expect("Invalid regex pattern for diverged histories")
});

static MISSING_BRANCH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)couldn't find remote ref")
        .expect("Invalid regex pattern for missing remote branches")
});

static UNREACHABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)could not resolve host|failed to connect|connection (refused|timed out|reset)|network is unreachable|unable to access|does not appear to be a git repository|could not read from remote repository",
    )
    .expect("Invalid regex pattern for unreachable remotes")
});

/// Network leg of a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Pull,
    Push,
}

impl Operation {
    /// Name of the git subcommand
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Pull => "pull",
            Operation::Push => "push",
        }
    }
}

/// Classify git's stderr into a failure kind
///
/// Authentication is checked before reachability because git reports a
/// refused token as "unable to access ... 403".
pub fn classify_failure(stderr: &str) -> FailureKind {
    if AUTH_PATTERN.is_match(stderr) {
        FailureKind::Authentication
    } else if REJECTED_PATTERN.is_match(stderr) {
        FailureKind::Rejected
    } else if DIVERGED_PATTERN.is_match(stderr) {
        FailureKind::Diverged
    } else if MISSING_BRANCH_PATTERN.is_match(stderr) {
        FailureKind::MissingBranch
    } else if UNREACHABLE_PATTERN.is_match(stderr) {
        FailureKind::Unreachable
    } else {
        FailureKind::Other
    }
}

/// Build the error for a failed network leg
pub fn transport_error(operation: Operation, remote: &str, stderr: &str) -> PackSyncError {
    let kind = classify_failure(stderr);
    let detail = summarize(stderr);

    match operation {
        Operation::Pull => PackSyncError::PullFailed {
            remote: remote.to_string(),
            kind,
            detail,
        },
        Operation::Push => PackSyncError::PushFailed {
            remote: remote.to_string(),
            kind,
            detail,
        },
    }
}

/// Keep git's own error lines, dropping progress and hint chatter
fn summarize(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("hint:"))
        .collect();

    if lines.is_empty() {
        "git exited with an error".to_string()
    } else {
        lines.join("\n  ")
    }
}
