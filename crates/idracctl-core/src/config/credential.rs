//! Controller credentials, optionally kept in the OS keyring
//!
//! A profile value of the form `keyring:<key>` is a reference into the
//! keyring under the `idracctl` service. Anything else is used as written.

use std::env;

use super::error::{ConfigError, Result};

/// Prefix marking a keyring reference in the config file
const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "idracctl";

/// Where new secrets end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    #[cfg(feature = "secure-storage")]
    Keyring,
    Plaintext,
}

/// Resolves and stores profile secrets
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Keyring when the feature is on and a keyring backend answers
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            if keyring::Entry::new(SERVICE_NAME, "__probe__").is_ok() {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    pub fn storage(&self) -> CredentialStorage {
        self.storage
    }

    /// Resolve a configured value.
    ///
    /// `env_var`, when given and set, wins over the configured value. A
    /// keyring reference is looked up; other values pass through.
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(from_env) = env::var(var)
        {
            return Ok(from_env);
        }

        match value.strip_prefix(KEYRING_PREFIX) {
            Some(key) => read_keyring(key),
            None => Ok(value.to_string()),
        }
    }

    /// Store `secret` and return what should be written to the config file
    pub fn store_credential(&self, key: &str, secret: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                keyring::Entry::new(SERVICE_NAME, key)
                    .and_then(|entry| entry.set_password(secret))
                    .map_err(|e| ConfigError::KeyringError(format!("storing '{}': {}", key, e)))?;
                Ok(format!("{}{}", KEYRING_PREFIX, key))
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(secret.to_string())
            }
        }
    }

    /// Drop a keyring entry; a missing entry is not an error
    pub fn delete_credential(&self, value: &str) -> Result<()> {
        let Some(_key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(());
        };
        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, _key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(ConfigError::KeyringError(e.to_string())),
            }
        }
        Ok(())
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}

#[cfg(feature = "secure-storage")]
fn read_keyring(key: &str) -> Result<String> {
    keyring::Entry::new(SERVICE_NAME, key)
        .and_then(|entry| entry.get_password())
        .map_err(|e| ConfigError::KeyringError(format!("reading '{}': {}", key, e)))
}

#[cfg(not(feature = "secure-storage"))]
fn read_keyring(key: &str) -> Result<String> {
    Err(ConfigError::CredentialError(format!(
        "'{}{}' needs the secure-storage feature",
        KEYRING_PREFIX, key
    )))
}
