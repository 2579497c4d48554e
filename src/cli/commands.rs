//! CLI command definitions using clap
//!
//! Defines the command structure for the `pack-sync` CLI tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// pack-sync - sync your pack directory to GitHub
///
/// Pulls the latest changes, commits everything that changed under the pack
/// directory, and pushes it using your stored GitHub token.
/// Run without a subcommand to sync.
#[derive(Parser, Debug)]
#[command(name = "pack-sync", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Configuration file holding the token and settings
    #[arg(long, global = true, env = "PACK_SYNC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Options for the default sync command
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull, commit the pack, and push (the default)
    Sync(SyncArgs),

    /// Show which changes a sync would commit
    Status(StatusArgs),

    /// Manage the stored GitHub token
    Auth(AuthArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Sync arguments
#[derive(Args, Debug, Default, Clone)]
pub struct SyncArgs {
    /// Commit message (prompted for, or the default, when omitted)
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Status arguments
#[derive(Args, Debug, Default, Clone)]
pub struct StatusArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store a Personal Access Token
    Login,
    /// Remove the stored token
    Logout,
    /// Show whether a token is available
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Remove a configuration value
    Remove {
        /// Configuration key
        key: ConfigKey,
    },

    /// Print the configuration file location
    Path,
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigKey {
    /// Directory whose changes are synced
    #[value(name = "pack-dir")]
    PackDir,

    /// Commit message used when none is given
    #[value(name = "default-message")]
    DefaultMessage,
}
