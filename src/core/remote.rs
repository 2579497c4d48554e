//! Token-authenticated access to a git remote
//!
//! A network leg runs while the remote's persisted URL carries the access
//! token. The original, token-free URL is written back on every exit path:
//! success, error, or a panic unwinding through the operation.

use std::cell::RefCell;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use url::Url;

use crate::core::git::GitRepository;
use crate::error::{PackSyncError, Result};

const HTTPS_PREFIX: &str = "https://";

/// Transport family of a remote URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlScheme {
    /// `https://`, the only scheme a token is injected into
    Https,
    /// `ssh://` or scp-like `user@host:path`
    Ssh,
    /// Local paths, `file://`, `http://`, `git://`
    Other,
}

impl UrlScheme {
    /// Detect the scheme of a remote URL
    pub fn detect(url: &str) -> Self {
        if url.starts_with(HTTPS_PREFIX) {
            UrlScheme::Https
        } else if url.starts_with("ssh://") || is_scp_like(url) {
            UrlScheme::Ssh
        } else {
            UrlScheme::Other
        }
    }

    /// Whether a token can be carried in the URL
    pub fn accepts_token(&self) -> bool {
        matches!(self, UrlScheme::Https)
    }
}

impl std::fmt::Display for UrlScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlScheme::Https => write!(f, "HTTPS"),
            UrlScheme::Ssh => write!(f, "SSH"),
            UrlScheme::Other => write!(f, "other"),
        }
    }
}

/// `git@github.com:owner/repo.git`: a colon before any slash, no scheme
fn is_scp_like(url: &str) -> bool {
    if url.contains("://") {
        return false;
    }
    match (url.find(':'), url.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    }
}

/// A remote's persisted URL together with its scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReference {
    pub url: String,
    pub scheme: UrlScheme,
}

impl RemoteReference {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let scheme = UrlScheme::detect(&url);
        Self { url, scheme }
    }

    /// The URL with `token` as userinfo, or `None` when no rewrite applies
    ///
    /// No rewrite for non-HTTPS schemes, URLs already carrying credentials,
    /// or URLs that already contain the token.
    pub fn authenticated_url(&self, token: &SecretString) -> Option<String> {
        let token = token.expose_secret();
        if !self.scheme.accepts_token() || token.is_empty() || self.url.contains(token) {
            return None;
        }

        let mut url = Url::parse(&self.url).ok()?;
        if !url.username().is_empty() || url.password().is_some() {
            return None;
        }

        url.set_username(token).ok()?;
        Some(url.to_string())
    }
}

/// The token as `Url::set_username` writes it, when that differs from the raw token
fn encoded_userinfo(token: &str) -> Option<String> {
    let mut url = Url::parse("https://host/").ok()?;
    url.set_username(token).ok()?;
    Some(url.username().to_string()).filter(|encoded| encoded != token)
}

/// Scrub both the raw and the percent-encoded token from an error
fn redact_token(err: PackSyncError, token: &str) -> PackSyncError {
    let err = err.redact(token);
    match encoded_userinfo(token) {
        Some(encoded) => err.redact(&encoded),
        None => err,
    }
}

/// Runs operations against a remote with the token injected into its URL
pub struct AuthenticatedRemote<'r> {
    repo: &'r GitRepository,
    remote: String,
    unrestored: RefCell<Option<String>>,
}

impl<'r> AuthenticatedRemote<'r> {
    pub fn new(repo: &'r GitRepository, remote: impl Into<String>) -> Self {
        Self {
            repo,
            remote: remote.into(),
            unrestored: RefCell::new(None),
        }
    }

    /// Name of the wrapped remote
    pub fn name(&self) -> &str {
        &self.remote
    }

    /// Token-free URL that could not be written back, if a restore failed
    ///
    /// While this is `Some`, the remote's persisted URL may still carry the token.
    pub fn unrestored_url(&self) -> Option<String> {
        self.unrestored.borrow().clone()
    }

    /// Run `operation` while the remote's URL carries `token`
    ///
    /// `operation` receives the remote name. The original URL is restored
    /// before this returns, whatever the operation did. A failed restore is
    /// logged and kept for [`AuthenticatedRemote::unrestored_url`]; it never
    /// replaces the operation's result. The token, raw or percent-encoded, is
    /// scrubbed from any error the operation returns.
    pub fn with_authenticated_remote<T, F>(&self, token: &SecretString, operation: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let reference = RemoteReference::new(self.repo.remote_url(&self.remote)?);

        let guard = match reference.authenticated_url(token) {
            Some(authenticated) => Some(UrlGuard::acquire(
                self.repo,
                &self.remote,
                reference.url.clone(),
                &authenticated,
            )?),
            None => {
                debug!(
                    remote = %self.remote,
                    scheme = %reference.scheme,
                    "remote URL used as-is"
                );
                None
            }
        };

        let result = operation(&self.remote).map_err(|e| redact_token(e, token.expose_secret()));

        if let Some(guard) = guard {
            if let Err(original) = guard.restore() {
                *self.unrestored.borrow_mut() = Some(original);
            }
        }

        result
    }
}

/// Holds a remote's original URL while an authenticated one is persisted
struct UrlGuard<'r> {
    repo: &'r GitRepository,
    remote: &'r str,
    original: String,
    armed: bool,
}

impl<'r> UrlGuard<'r> {
    /// Persist `authenticated`; the guard restores `original` if this fails
    fn acquire(
        repo: &'r GitRepository,
        remote: &'r str,
        original: String,
        authenticated: &str,
    ) -> Result<Self> {
        let guard = Self {
            repo,
            remote,
            original,
            armed: true,
        };
        repo.set_remote_url(remote, authenticated)?;
        debug!(remote, "authenticated URL in place");
        Ok(guard)
    }

    /// Write the original URL back, handing it back if that failed
    fn restore(mut self) -> std::result::Result<(), String> {
        self.armed = false;
        if self.write_back() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.original))
        }
    }

    fn write_back(&self) -> bool {
        match self.repo.set_remote_url(self.remote, &self.original) {
            Ok(()) => {
                debug!(remote = self.remote, "original URL restored");
                true
            }
            Err(e) => {
                error!(
                    remote = self.remote,
                    "Failed to restore the URL of remote '{}': {}. The access token may still be \
                     stored in .git/config. Fix it with: git remote set-url {} {}",
                    self.remote,
                    e,
                    self.remote,
                    self.original
                );
                false
            }
        }
    }
}

impl Drop for UrlGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.write_back();
        }
    }
}
