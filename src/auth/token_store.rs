use keyring::{Entry, Error as KeyringError};

use crate::error::ConfigError;

const SERVICE: &str = "inbox_harvest";

/// Credentials the tool needs, looked up in the environment first, then the keyring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Secret {
    /// Authorization token for the read-it-later service
    InboxToken,
    /// API key for the chat-completion service
    LlmApiKey,
}

impl Secret {
    fn username(self) -> &'static str {
        match self {
            Secret::InboxToken => "inbox-token",
            Secret::LlmApiKey => "llm-api-key",
        }
    }

    pub fn env_vars(self) -> &'static [&'static str] {
        match self {
            Secret::InboxToken => &["INBOX_TOKEN"],
            Secret::LlmApiKey => &["LLM_API_KEY", "OPENAI_API_KEY"],
        }
    }
}

fn keyring_err(e: KeyringError) -> ConfigError {
    ConfigError::Keyring(e.to_string())
}

/// Save a secret into the OS keyring
pub fn save_secret(secret: Secret, value: &str) -> Result<(), ConfigError> {
    let entry = Entry::new(SERVICE, secret.username()).map_err(keyring_err)?;
    entry.set_password(value).map_err(keyring_err)?;
    Ok(())
}

/// Load a secret from the keyring, `None` when it was never stored
pub fn load_secret(secret: Secret) -> Result<Option<String>, ConfigError> {
    let entry = Entry::new(SERVICE, secret.username()).map_err(keyring_err)?;
    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(keyring_err(e)),
    }
}

fn from_env(secret: Secret) -> Option<String> {
    secret
        .env_vars()
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Resolve a secret from the environment, then the keyring.
pub fn resolve(secret: Secret) -> Result<String, ConfigError> {
    if let Some(v) = from_env(secret) {
        return Ok(v);
    }
    load_secret(secret)?.ok_or_else(|| ConfigError::MissingCredential {
        name: secret.username().to_string(),
        hint: format!(
            "set {} or run `inbox_harvest set-secret {}`",
            secret.env_vars()[0],
            secret.username()
        ),
    })
}
