//! Terminal prompts for the token and commit message

use std::io::{self, BufRead, IsTerminal, Write};
use std::process::Command;

use secrecy::SecretString;

use crate::core::input::InputProvider;
use crate::error::Result;

/// Page that creates a classic token with the `repo` scope
pub const TOKEN_CREATION_URL: &str =
    "https://github.com/settings/tokens/new?scopes=repo&description=pack-sync";

/// [`InputProvider`] reading from stdin
///
/// Only prompts when stdin is a terminal; otherwise every answer is "none",
/// so scripted runs fall back to defaults instead of blocking.
pub struct TerminalInput {
    message: Option<String>,
    interactive: bool,
}

impl TerminalInput {
    /// `message` short-circuits the commit message prompt
    pub fn new(message: Option<String>) -> Self {
        Self {
            message,
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl InputProvider for TerminalInput {
    fn token(&self) -> Result<Option<SecretString>> {
        if !self.interactive {
            return Ok(None);
        }
        prompt_token()
    }

    fn commit_message(&self) -> Result<Option<String>> {
        if let Some(message) = &self.message {
            return Ok(Some(message.clone()));
        }
        if !self.interactive {
            return Ok(None);
        }

        print!("Commit message (leave empty for the default): ");
        io::stdout().flush()?;
        read_line()
    }
}

/// Explain how to create a token, then read one from stdin
pub fn prompt_token() -> Result<Option<SecretString>> {
    println!("GitHub Token Required");
    println!("=====================");
    println!();
    println!("pack-sync pushes with a Personal Access Token that is stored on this");
    println!("computer only.");
    println!();
    println!("To create a token:");
    println!("  1. Go to: {}", TOKEN_CREATION_URL);
    println!("  2. Select the 'repo' scope");
    println!("  3. Click 'Generate token' and copy it");
    println!();

    // Try to open the token creation page
    if open_browser(TOKEN_CREATION_URL) {
        println!("✓ Browser opened to token creation page.");
        println!();
    }

    print!("Paste your token here: ");
    io::stdout().flush()?;

    Ok(read_line()?.map(SecretString::from))
}

/// Read one trimmed line; `None` when empty or at end of input
fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// Try to open a URL in the default browser
fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn().is_ok()
    }

    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open").arg(url).spawn().is_ok()
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .is_ok()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = url;
        false
    }
}
