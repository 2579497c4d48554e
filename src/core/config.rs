//! Application configuration management
//!
//! Settings live in the same TOML document as the stored token:
//! - `pack_dir`: the directory whose changes are synced
//! - `default_message`: commit message used when none is given

use std::path::{Component, Path, PathBuf};

use directories::ProjectDirs;

use crate::core::document::Document;
use crate::error::{PackSyncError, Result};

/// Directory synced when `pack_dir` is not configured
pub const DEFAULT_PACK_DIR: &str = "pack";

/// Remote every sync runs against
pub const DEFAULT_REMOTE: &str = "origin";

/// Commit message used when the caller supplies none
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update pack";

pub(crate) const PACK_DIR_KEY: &str = "pack_dir";
pub(crate) const DEFAULT_MESSAGE_KEY: &str = "default_message";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Top-level directory whose changes are synced
    pub pack_dir: String,

    /// Remote to pull from and push to
    pub remote: String,

    /// Commit message used when none is given
    pub default_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pack_dir: DEFAULT_PACK_DIR.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            default_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl Config {
    /// Read settings from a document, falling back to defaults
    pub fn from_document(document: &Document) -> Result<Self> {
        let mut config = Config::default();

        if let Some(pack_dir) = document.load(PACK_DIR_KEY) {
            config.pack_dir = validate_pack_dir(&pack_dir)?;
        }

        if let Some(message) = document.load(DEFAULT_MESSAGE_KEY) {
            let message = message.trim();
            if !message.is_empty() {
                config.default_message = message.to_string();
            }
        }

        Ok(config)
    }

    /// Resolve the configuration file, preferring an explicit override
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path),
            None => Self::config_path(),
        }
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "pack-sync", "pack-sync").ok_or_else(|| {
            PackSyncError::Config("Could not determine config directory".into())
        })?;

        Ok(project_dirs.config_dir().to_path_buf())
    }
}

/// Check that `name` is a single directory at the repository root
///
/// A trailing slash is accepted and stripped.
pub fn validate_pack_dir(name: &str) -> Result<String> {
    let trimmed = name.trim().trim_end_matches('/');
    let mut components = Path::new(trimmed).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part != ".git" => Ok(trimmed.to_string()),
        _ => Err(PackSyncError::InvalidPackDir(name.to_string())),
    }
}
