use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

const API_KEY_ENV: &str = "BRAINWEEK_GEMINI_API_KEY";

pub trait CredentialStore: Send + Sync {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError>;
    fn load_api_key(&self) -> Result<Option<String>, InfraError>;
    fn delete_api_key(&self) -> Result<(), InfraError>;
}

/// Keeps the language-service API key in the operating system keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
    account_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, InfraError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new("brainweek.gemini", "default")
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError> {
        self.entry()?
            .set_password(api_key)
            .map_err(|error| InfraError::Credential(error.to_string()))
    }

    fn load_api_key(&self) -> Result<Option<String>, InfraError> {
        match self.entry()?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }

    fn delete_api_key(&self) -> Result<(), InfraError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(InfraError::Credential(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    api_key: Mutex<Option<String>>,
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_api_key(&self, api_key: &str) -> Result<(), InfraError> {
        let mut guard = self
            .api_key
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(api_key.to_string());
        Ok(())
    }

    fn load_api_key(&self) -> Result<Option<String>, InfraError> {
        let guard = self
            .api_key
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn delete_api_key(&self) -> Result<(), InfraError> {
        let mut guard = self
            .api_key
            .lock()
            .map_err(|error| InfraError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }
}

/// Resolution order: keyring entry, then environment variable. A keyring
/// backend that is unavailable on the host counts as absent rather than
/// fatal.
pub fn resolve_api_key(store: &dyn CredentialStore) -> Option<String> {
    resolve_api_key_from_lookup(store, |key| std::env::var(key).ok())
}

pub fn resolve_api_key_from_lookup(
    store: &dyn CredentialStore,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Ok(Some(api_key)) = store.load_api_key() {
        let api_key = api_key.trim();
        if !api_key.is_empty() {
            return Some(api_key.to_string());
        }
    }
    lookup(API_KEY_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
