//! Core functionality for pack-sync
//!
//! This module contains the sync protocol and its building blocks:
//! - Git repository operations
//! - Scoped change detection
//! - Token-authenticated remote access
//! - Credential and settings storage
//! - The sync orchestrator

pub mod changes;
pub mod config;
pub mod credentials;
pub mod document;
pub mod error_handler;
pub mod git;
pub mod input;
pub mod remote;
pub mod sync;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use changes::ChangeSet;
pub use config::Config;
pub use credentials::CredentialStore;
pub use document::Document;
pub use git::GitRepository;
pub use input::{InputProvider, PresetInput};
pub use remote::{AuthenticatedRemote, RemoteReference, UrlScheme};
pub use sync::{PullStatus, SyncOrchestrator, SyncOutcome, SyncReport, SyncSettings};
pub use transport::{GitCli, Transport};
