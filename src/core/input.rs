//! User input consumed by a sync run
//!
//! The sync core never prompts on its own. Whatever asks the user (a
//! terminal, a script, a test) implements [`InputProvider`].

use secrecy::SecretString;

use crate::error::Result;

/// Source of the values a sync run needs from the user
pub trait InputProvider {
    /// Ask for an access token; `None` when the user provides none
    fn token(&self) -> Result<Option<SecretString>>;

    /// Ask for a commit message; `None` selects the default message
    fn commit_message(&self) -> Result<Option<String>>;
}

/// Input fixed up front, for scripted and non-interactive use
#[derive(Debug, Default)]
pub struct PresetInput {
    token: Option<SecretString>,
    message: Option<String>,
}

impl PresetInput {
    pub fn new(token: Option<SecretString>, message: Option<String>) -> Self {
        Self { token, message }
    }
}

impl InputProvider for PresetInput {
    fn token(&self) -> Result<Option<SecretString>> {
        Ok(self.token.clone())
    }

    fn commit_message(&self) -> Result<Option<String>> {
        Ok(self.message.clone())
    }
}
