//! Status CLI command handler
//!
//! Read-only preview of what the next sync would commit.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::commands::StatusArgs;
use crate::core::changes::ChangeSet;
use crate::core::config::Config;
use crate::core::document::Document;
use crate::core::git::{FileStatus, GitRepository};
use crate::core::remote::RemoteReference;
use crate::error::Result;

/// JSON shape of `pack-sync status --json`
#[derive(Debug, Serialize)]
struct StatusView<'a> {
    branch: String,
    pack_dir: &'a str,
    remote: &'a str,
    remote_scheme: String,
    clean: bool,
    scoped: Vec<&'a FileStatus>,
    unscoped: Vec<&'a FileStatus>,
}

/// Handle the status command
pub fn handle_status(args: StatusArgs, config_path: Option<PathBuf>) -> Result<()> {
    let git = GitRepository::open_current_dir()?;
    let document = Document::open(Config::resolve_path(config_path)?)?;
    let config = Config::from_document(&document)?;

    let reference = RemoteReference::new(git.remote_url(&config.remote)?);
    let changes = ChangeSet::scan(&git)?;

    let view = StatusView {
        branch: git.current_branch()?,
        pack_dir: &config.pack_dir,
        remote: &config.remote,
        remote_scheme: reference.scheme.to_string(),
        clean: changes.is_clean(),
        scoped: changes.scoped_files(&config.pack_dir).collect(),
        unscoped: changes.unscoped_files(&config.pack_dir).collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "On branch {} → {} ({})",
        view.branch, view.remote, view.remote_scheme
    );
    if !reference.scheme.accepts_token() {
        println!("  The remote does not use HTTPS, so the token is not injected.");
    }

    if view.clean {
        println!("\nNothing to sync. Working tree is clean.");
        return Ok(());
    }

    if view.scoped.is_empty() {
        println!("\nNo changes in '{}/'.", view.pack_dir);
    } else {
        println!("\nChanges to be synced from '{}/':", view.pack_dir);
        for file in &view.scoped {
            println!("  {} {}", file.status_char(), file.path);
        }
    }

    if !view.unscoped.is_empty() {
        println!("\nChanges outside the pack (never synced):");
        for file in &view.unscoped {
            println!("  {} {}", file.status_char(), file.path);
        }
    }

    Ok(())
}
