//! Portal credentials.
//!
//! Credentials come from the `ILIAD_USER_ID` and `ILIAD_PASSWORD`
//! environment variables. When either is missing, the user is prompted
//! for the missing value(s):
//!
//! ```text
//! === Iliad Account Login ===
//! ID utente (8 cifre): 12345678
//! Password:
//! ```

mod prompt;

#[cfg(feature = "cli")]
pub use prompt::TerminalPrompt;
pub use prompt::CredentialPrompt;

use std::fmt;

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::config::{Env, PASSWORD_VAR, USER_ID_VAR};

/// Identifier and password for one portal login.
///
/// The identifier is expected to be 8 digits but is not validated.
pub struct Credentials {
    identifier: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: SecretString) -> Self {
        Self {
            identifier: identifier.into(),
            secret,
        }
    }

    /// Read credentials from the environment, prompting for whatever is missing.
    pub fn resolve(env: &Env, prompt: &dyn CredentialPrompt) -> Result<Self> {
        let identifier = env.get(USER_ID_VAR).map(str::to_string);
        let secret = env.get(PASSWORD_VAR).map(SecretString::from);

        match (identifier, secret) {
            (Some(identifier), Some(secret)) => Ok(Self::new(identifier, secret)),
            (identifier, secret) => {
                prompt.begin()?;
                let identifier = match identifier {
                    Some(identifier) => identifier,
                    None => prompt.identifier()?,
                };
                let secret = match secret {
                    Some(secret) => secret,
                    None => prompt.secret()?,
                };
                Ok(Self::new(identifier, secret))
            }
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// The identifier with all but its last two characters masked.
    pub fn masked_identifier(&self) -> String {
        let count = self.identifier.chars().count();
        let visible = count.min(2);
        let mut masked = "*".repeat(count - visible);
        masked.extend(self.identifier.chars().skip(count - visible));
        masked
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.masked_identifier())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
