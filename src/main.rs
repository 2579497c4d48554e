//! pack-sync - one-shot sync of a pack directory to GitHub
//!
//! Run without arguments to pull, commit the pack, and push.
//! Use subcommands to preview changes or manage the stored token.

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pack_sync::cli::commands::{Cli, Commands};
use pack_sync::cli::{auth, config, status, sync};
use pack_sync::core::git::GitRepository;
use pack_sync::error::{ErrorClass, PackSyncError, Result};

fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run() {
        handle_error(&e);
        std::process::exit(1);
    }
}

/// Print the error, with extra context for failures after the commit
fn handle_error(e: &PackSyncError) {
    eprintln!("Error: {}", e);

    if e.class() == ErrorClass::FatalNetwork {
        eprintln!();
        eprintln!("Your pack changes were committed locally but not pushed.");
        eprintln!("  → Once the problem above is fixed, run 'git push' to publish them.");
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Auth and config commands don't require git repository
        Some(Commands::Auth(args)) => auth::handle_auth(args.command, cli.config),
        Some(Commands::Config(args)) => config::handle_config(args.command, cli.config),

        Some(Commands::Status(args)) => {
            ensure_git_repository()?;
            status::handle_status(args, cli.config)
        }
        Some(Commands::Sync(args)) => {
            ensure_git_repository()?;
            sync::handle_sync(args, cli.config)
        }
        // No subcommand - sync
        None => {
            ensure_git_repository()?;
            sync::handle_sync(cli.sync, cli.config)
        }
    }
}

/// Ensure we're in a git repository
fn ensure_git_repository() -> Result<()> {
    if !GitRepository::is_git_repository() {
        return Err(PackSyncError::NotGitRepository);
    }
    Ok(())
}
