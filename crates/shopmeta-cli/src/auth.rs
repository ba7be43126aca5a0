//! Admin API token storage with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "shopmeta-cli";

#[derive(Clone)]
pub struct TokenStore {
    username: String,
}

impl TokenStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("admin_api_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry, CliError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(not(test))]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    pub fn save(&self, token: &str) -> Result<(), CliError> {
        self.entry()?
            .set_password(token)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(test)]
    pub fn save(&self, token: &str) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.insert(self.username.clone(), token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    pub fn clear(&self) -> Result<(), CliError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn clear(&self) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Token for display: first four characters, rest masked.
pub fn mask_token(token: &str) -> String {
    let visible = token.chars().take(4).collect::<String>();
    format!("{visible}…")
}
