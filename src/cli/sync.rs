//! Sync CLI command handler

use std::path::PathBuf;

use crate::cli::commands::SyncArgs;
use crate::cli::prompt::TerminalInput;
use crate::core::config::Config;
use crate::core::credentials::CredentialStore;
use crate::core::document::Document;
use crate::core::git::GitRepository;
use crate::core::sync::{PullStatus, SyncOrchestrator, SyncOutcome, SyncSettings};
use crate::core::transport::GitCli;
use crate::error::Result;

/// Handle the sync command
pub fn handle_sync(args: SyncArgs, config_path: Option<PathBuf>) -> Result<()> {
    // Everything up to the orchestrator is read-only
    let git = GitRepository::open_current_dir()?;
    let document = Document::open(Config::resolve_path(config_path)?)?;
    let config = Config::from_document(&document)?;
    git.remote_url(&config.remote)?;
    let branch = git.current_branch()?;

    let input = TerminalInput::new(args.message);
    let mut store = CredentialStore::new(document).with_env_override();
    let token = store.require_token(&input)?;

    let transport = GitCli::new(git.root_dir()?);
    let orchestrator = SyncOrchestrator::new(
        &git,
        &transport,
        &input,
        token,
        SyncSettings::from(&config),
    );

    println!(
        "Syncing '{}/' on branch {} with {}...",
        config.pack_dir, branch, config.remote
    );
    let result = orchestrator.run();
    if let Some(url) = orchestrator.unrestored_url() {
        report_unrestored_url(&config.remote, &url);
    }
    let report = result?;

    if let PullStatus::Failed(_) = report.pull {
        println!("⚠ Pull failed (see above); continued with local changes.");
    }

    match report.outcome {
        SyncOutcome::Clean => {
            println!("✓ Nothing to sync. Working tree is clean.");
        }
        SyncOutcome::OutOfScopeOnly { paths } => {
            println!(
                "✓ Nothing to sync in '{}/'. Changes elsewhere were left untouched:",
                config.pack_dir
            );
            for path in paths {
                println!("  {}", path);
            }
        }
        SyncOutcome::CommittedAndPushed { commit, files } => {
            println!(
                "✓ Created commit: {}",
                &commit[..8.min(commit.len())]
            );
            for file in &files {
                println!("  {}", file);
            }
            println!("✓ Pushed to {}/{}", config.remote, report.branch);
        }
    }

    Ok(())
}

/// The token may still be in `.git/config`; say so even when logging is off
fn report_unrestored_url(remote: &str, url: &str) {
    eprintln!(
        "⚠ Could not restore the URL of remote '{}'. Your access token may still be stored in .git/config.",
        remote
    );
    eprintln!("  → Fix it with: git remote set-url {} {}", remote, url);
}
