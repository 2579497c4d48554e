//! Configuration CLI command handlers

use std::path::PathBuf;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::{
    validate_pack_dir, Config, DEFAULT_MESSAGE_KEY, PACK_DIR_KEY,
};
use crate::core::document::Document;
use crate::error::{PackSyncError, Result};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand, config_path: Option<PathBuf>) -> Result<()> {
    let path = Config::resolve_path(config_path)?;
    if let ConfigCommand::Path = command {
        println!("{}", path.display());
        return Ok(());
    }

    let mut document = Document::open(path)?;
    match command {
        ConfigCommand::Set { key, value } => handle_set(&mut document, key, value),
        ConfigCommand::Get { key } => handle_get(&document, key),
        ConfigCommand::Remove { key } => handle_remove(&mut document, key),
        ConfigCommand::Path => Ok(()),
    }
}

fn document_key(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::PackDir => PACK_DIR_KEY,
        ConfigKey::DefaultMessage => DEFAULT_MESSAGE_KEY,
    }
}

/// Handle setting a configuration value
fn handle_set(document: &mut Document, key: ConfigKey, value: String) -> Result<()> {
    match key {
        ConfigKey::PackDir => {
            let pack_dir = validate_pack_dir(&value)?;
            document.save(document_key(key), &pack_dir)?;
            println!("Pack directory set to: {}", pack_dir);
        }
        ConfigKey::DefaultMessage => {
            let message = value.trim();
            if message.is_empty() {
                return Err(PackSyncError::InvalidInput(
                    "The default commit message cannot be empty".to_string(),
                ));
            }
            document.save(document_key(key), message)?;
            println!("Default commit message set to: {}", message);
        }
    }
    Ok(())
}

/// Handle getting a configuration value
fn handle_get(document: &Document, key: ConfigKey) -> Result<()> {
    let config = Config::from_document(document)?;
    match key {
        ConfigKey::PackDir => println!("Pack directory: {}", config.pack_dir),
        ConfigKey::DefaultMessage => println!("Default commit message: {}", config.default_message),
    }
    Ok(())
}

/// Handle removing a configuration value
fn handle_remove(document: &mut Document, key: ConfigKey) -> Result<()> {
    document.remove(document_key(key))?;
    let config = Config::from_document(document)?;
    match key {
        ConfigKey::PackDir => {
            println!("Pack directory reset to default: {}", config.pack_dir)
        }
        ConfigKey::DefaultMessage => println!(
            "Default commit message reset to default: {}",
            config.default_message
        ),
    }
    Ok(())
}
