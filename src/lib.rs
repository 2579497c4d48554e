//! pack-sync - keep one directory of a git working copy in sync with GitHub
//!
//! Pulls, commits whatever changed under the pack directory, and pushes,
//! authenticating with a stored access token that is never left behind in
//! the repository's remote configuration.

pub mod cli;
pub mod core;
pub mod error;

pub use error::{PackSyncError, Result};
