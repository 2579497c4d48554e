//! CLI module for pack-sync
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod commands;
pub mod auth;
pub mod config;
pub mod prompt;
pub mod status;
pub mod sync;

pub use commands::{Cli, Commands};
