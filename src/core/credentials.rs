//! Access token storage
//!
//! The token lives in cleartext in the local config document under the
//! `github_token` key. The file is restricted to its owner after every write
//! on platforms that support Unix permissions.
//!
//! ## Environment Variable Fallback
//!
//! For CI and scripted use, a non-empty `GITHUB_TOKEN` takes priority over
//! the document when the store is built with [`CredentialStore::with_env_override`].

use std::io;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::core::document::Document;
use crate::core::input::InputProvider;
use crate::error::{PackSyncError, Result};

const GITHUB_TOKEN_KEY: &str = "github_token";
const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Where the current token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `GITHUB_TOKEN` environment variable
    Environment,
    /// The config document
    Document,
}

/// Credential store holding the one access token
pub struct CredentialStore {
    document: Document,
    env_token: Option<SecretString>,
}

impl CredentialStore {
    /// Build a store over a loaded document
    pub fn new(document: Document) -> Self {
        Self {
            document,
            env_token: None,
        }
    }

    /// Let a non-empty `GITHUB_TOKEN` take priority over the document
    pub fn with_env_override(mut self) -> Self {
        if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
            if !token.is_empty() {
                self.env_token = Some(SecretString::from(token));
            }
        }
        self
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        self.document.path()
    }

    /// Retrieve the token
    ///
    /// Priority: environment variable > document
    pub fn get_token(&self) -> Option<SecretString> {
        self.get_token_with_source().map(|(token, _)| token)
    }

    /// Retrieve the token along with where it was found
    pub fn get_token_with_source(&self) -> Option<(SecretString, TokenSource)> {
        if let Some(token) = &self.env_token {
            return Some((token.clone(), TokenSource::Environment));
        }

        self.document
            .load(GITHUB_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .map(|token| (SecretString::from(token), TokenSource::Document))
    }

    /// Check if a token is available
    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Persist the token and restrict the document to its owner
    pub fn set_token(&mut self, token: &SecretString) -> Result<()> {
        self.document
            .save(GITHUB_TOKEN_KEY, token.expose_secret())?;

        if let Err(e) = restrict_permissions(self.document.path()) {
            warn!(
                path = %self.document.path().display(),
                "Could not restrict permissions on the token file: {}", e
            );
        }

        debug!(path = %self.document.path().display(), "stored access token");
        Ok(())
    }

    /// Delete the stored token; returns whether one was stored
    pub fn delete_token(&mut self) -> Result<bool> {
        self.document.remove(GITHUB_TOKEN_KEY)
    }

    /// Return the stored token, asking `input` for one when none is stored
    ///
    /// A token obtained from `input` is persisted before it is returned.
    pub fn require_token(&mut self, input: &dyn InputProvider) -> Result<SecretString> {
        if let Some(token) = self.get_token() {
            return Ok(token);
        }

        let token = input
            .token()?
            .map(|token| token.expose_secret().trim().to_string())
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or(PackSyncError::NotAuthenticated)?;

        self.set_token(&token)?;
        Ok(token)
    }

    /// Get a masked version of a token for display (shows first 4 and last 4 chars)
    pub fn mask_token(token: &SecretString) -> String {
        let exposed = token.expose_secret();
        if exposed.chars().count() <= 8 {
            "*".repeat(exposed.chars().count())
        } else {
            let head: String = exposed.chars().take(4).collect();
            let tail: String = exposed
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
