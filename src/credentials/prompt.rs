use anyhow::Result;
use secrecy::SecretString;

/// Interactive source for credentials missing from the environment.
pub trait CredentialPrompt {
    /// Called once before the first question is asked.
    fn begin(&self) -> Result<()> {
        Ok(())
    }

    /// Ask for the user identifier. The answer is echoed.
    fn identifier(&self) -> Result<String>;

    /// Ask for the password. The answer is not echoed.
    fn secret(&self) -> Result<SecretString>;
}

/// Prompts on the controlling terminal.
#[cfg(feature = "cli")]
#[derive(Debug, Default)]
pub struct TerminalPrompt;

#[cfg(feature = "cli")]
impl CredentialPrompt for TerminalPrompt {
    fn begin(&self) -> Result<()> {
        println!("=== Iliad Account Login ===");
        Ok(())
    }

    fn identifier(&self) -> Result<String> {
        use anyhow::Context;
        use dialoguer::Input;

        let identifier: String = Input::new()
            .with_prompt("ID utente (8 cifre)")
            .interact_text()
            .context("Failed to read user id")?;
        Ok(identifier.trim().to_string())
    }

    fn secret(&self) -> Result<SecretString> {
        use anyhow::Context;
        use dialoguer::Password;

        let password = Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?;
        Ok(SecretString::from(password))
    }
}
