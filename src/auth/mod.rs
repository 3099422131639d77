//! API key storage in the system keyring.
//!
//! `GROQ_API_KEY` takes precedence over the keyring so the client can run in
//! environments without a secret service.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, BufRead, Write};

use keyring::Entry;
use tracing::debug;

const KEYRING_SERVICE: &str = "genie";
const KEYRING_USER: &str = "groq";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug)]
pub enum AuthError {
    /// The platform keyring could not be reached or refused the request.
    Keyring(keyring::Error),
    /// Neither the environment nor the keyring holds a key.
    MissingKey,
    /// Reading the key from the terminal failed.
    Prompt(io::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Keyring(err) => write!(f, "Keyring error: {err}"),
            AuthError::MissingKey => write!(
                f,
                "No API key configured. Run `genie auth` or set {API_KEY_ENV}."
            ),
            AuthError::Prompt(err) => write!(f, "Failed to read API key: {err}"),
        }
    }
}

impl StdError for AuthError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AuthError::Keyring(err) => Some(err),
            AuthError::Prompt(err) => Some(err),
            AuthError::MissingKey => None,
        }
    }
}

impl From<keyring::Error> for AuthError {
    fn from(err: keyring::Error) -> Self {
        AuthError::Keyring(err)
    }
}

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Keyring,
}

pub struct AuthManager {
    use_keyring: bool,
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    fn entry() -> Result<Entry, AuthError> {
        Ok(Entry::new(KEYRING_SERVICE, KEYRING_USER)?)
    }

    pub fn store_token(&self, token: &str) -> Result<(), AuthError> {
        if !self.use_keyring {
            return Ok(());
        }
        Self::entry()?.set_password(token)?;
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, AuthError> {
        if !self.use_keyring {
            return Ok(None);
        }
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns whether a stored key was removed.
    pub fn remove_token(&self) -> Result<bool, AuthError> {
        if !self.use_keyring {
            return Ok(false);
        }
        match Self::entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn resolve_api_key(&self) -> Result<(String, KeySource), AuthError> {
        self.resolve_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_with_env(&self, env_value: Option<String>) -> Result<(String, KeySource), AuthError> {
        if let Some(key) = env_value.filter(|key| !key.trim().is_empty()) {
            debug!("Using API key from environment");
            return Ok((key.trim().to_string(), KeySource::Environment));
        }
        match self.get_token()? {
            Some(key) => {
                debug!("Using API key from keyring");
                Ok((key, KeySource::Keyring))
            }
            None => Err(AuthError::MissingKey),
        }
    }

    pub fn interactive_auth(&self) -> Result<(), AuthError> {
        println!("🔐 Genie Authentication Setup");
        println!("Paste your Groq API key (https://console.groq.com/keys).");
        let token = prompt_token(&mut io::stdin().lock(), &mut io::stdout())?;
        if token.is_empty() {
            println!("No key entered; nothing changed.");
            return Ok(());
        }
        self.store_token(&token)?;
        println!("✅ API key stored in the system keyring.");
        Ok(())
    }

    pub fn interactive_deauth(&self) -> Result<(), AuthError> {
        if self.remove_token()? {
            println!("✅ Removed API key from the system keyring.");
        } else {
            println!("No stored API key found.");
        }
        Ok(())
    }
}

fn prompt_token<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String, AuthError> {
    write!(output, "API key: ").map_err(AuthError::Prompt)?;
    output.flush().map_err(AuthError::Prompt)?;
    let mut line = String::new();
    input.read_line(&mut line).map_err(AuthError::Prompt)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_key_wins() {
        let auth = AuthManager::new_with_keyring(false);
        let (key, source) = auth.resolve_with_env(Some(" gsk_test \n".into())).unwrap();
        assert_eq!(key, "gsk_test");
        assert_eq!(source, KeySource::Environment);
    }

    #[test]
    fn missing_key_is_reported() {
        let auth = AuthManager::new_with_keyring(false);
        let err = auth.resolve_with_env(Some("   ".into())).unwrap_err();
        assert!(matches!(err, AuthError::MissingKey));
        assert!(err.to_string().contains("genie auth"));
    }

    #[test]
    fn prompt_reads_one_trimmed_line() {
        let mut input = io::Cursor::new("  gsk_abc  \nignored\n");
        let mut output = Vec::new();
        let token = prompt_token(&mut input, &mut output).unwrap();
        assert_eq!(token, "gsk_abc");
        assert_eq!(output, b"API key: ");
    }

    #[test]
    fn disabled_keyring_is_inert() {
        let auth = AuthManager::new_with_keyring(false);
        assert!(auth.store_token("x").is_ok());
        assert_eq!(auth.get_token().unwrap(), None);
        assert!(!auth.remove_token().unwrap());
    }
}
