//! Flat key/value document stored as TOML
//!
//! Backs both the credential store and the user settings. Keys absent from
//! the file, or holding a non-string value, read as `None`.

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::Result;

/// A TOML file holding string values under top-level keys
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    table: Table,
}

impl Document {
    /// Open the document at `path`, treating a missing file as empty
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let table = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            contents.parse::<Table>()?
        } else {
            Table::new()
        };

        Ok(Self { path, table })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a string value
    pub fn load(&self, key: &str) -> Option<String> {
        self.table
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Set a string value and write the document to disk
    pub fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.table
            .insert(key.to_string(), Value::String(value.to_string()));
        self.write()
    }

    /// Remove a key, writing the document only if it was present
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.table.remove(key).is_none() {
            return Ok(false);
        }
        self.write()?;
        Ok(true)
    }

    fn write(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(&self.table)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
