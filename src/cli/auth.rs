//! Authentication CLI command handlers

use std::path::PathBuf;

use crate::cli::commands::AuthCommand;
use crate::cli::prompt::prompt_token;
use crate::core::config::Config;
use crate::core::credentials::{CredentialStore, TokenSource};
use crate::core::document::Document;
use crate::error::{PackSyncError, Result};

/// Handle authentication commands
pub fn handle_auth(command: AuthCommand, config_path: Option<PathBuf>) -> Result<()> {
    let document = Document::open(Config::resolve_path(config_path)?)?;
    let store = CredentialStore::new(document);

    match command {
        AuthCommand::Login => handle_login(store),
        AuthCommand::Logout => handle_logout(store),
        AuthCommand::Status => handle_status(store.with_env_override()),
    }
}

/// Handle login using a Personal Access Token
fn handle_login(mut store: CredentialStore) -> Result<()> {
    // Check if already authenticated
    if store.has_token() {
        println!("✓ A GitHub token is already stored.");
        println!();
        println!("  To replace it, first run: pack-sync auth logout");
        return Ok(());
    }

    let token = prompt_token()?
        .ok_or_else(|| PackSyncError::InvalidInput("No token provided".to_string()))?;
    store.set_token(&token)?;

    println!();
    println!("✓ Token stored in {}", store.path().display());
    Ok(())
}

/// Handle the logout command
fn handle_logout(mut store: CredentialStore) -> Result<()> {
    if store.delete_token()? {
        println!("Stored token removed.");
    } else {
        println!("No token is stored.");
    }
    Ok(())
}

/// Handle the status command
fn handle_status(store: CredentialStore) -> Result<()> {
    println!("Authentication Status:");
    match store.get_token_with_source() {
        Some((token, source)) => {
            let origin = match source {
                TokenSource::Environment => "GITHUB_TOKEN environment variable".to_string(),
                TokenSource::Document => store.path().display().to_string(),
            };
            println!("  GitHub: Token available");
            println!("  Token: {}", CredentialStore::mask_token(&token));
            println!("  Source: {}", origin);
        }
        None => {
            println!("  GitHub: Not authenticated");
            println!();
            println!("  Run 'pack-sync auth login' to store a token.");
        }
    }
    Ok(())
}
