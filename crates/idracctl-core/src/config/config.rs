//! Profile configuration
//!
//! Configuration is stored in TOML with multiple named profiles, one per
//! controller. Values may reference environment variables and keyring
//! entries.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::retry::RetrySettings;
use crate::policy::RetryPolicy;

/// Environment overrides applied on top of the selected profile
pub const ENV_URL: &str = "IDRACCTL_URL";
pub const ENV_USERNAME: &str = "IDRACCTL_USERNAME";
pub const ENV_PASSWORD: &str = "IDRACCTL_PASSWORD";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One controller
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Controller base URL, e.g. `https://10.0.0.20`
    pub url: String,
    pub username: String,
    /// Optional so it can come from the environment or a prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Accept self-signed certificates
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_manager_id")]
    pub manager_id: String,
    #[serde(default = "default_system_id")]
    pub system_id: String,
    /// Retry budget overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
}

fn default_manager_id() -> String {
    "iDRAC.Embedded.1".to_string()
}

fn default_system_id() -> String {
    "System.Embedded.1".to_string()
}

/// A profile with every credential resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub url: String,
    pub username: String,
    pub password: Option<String>,
    pub insecure: bool,
    pub manager_id: String,
    pub system_id: String,
    pub policy: RetryPolicy,
}

impl Profile {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: None,
            insecure: false,
            manager_id: default_manager_id(),
            system_id: default_system_id(),
            retry: None,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetrySettings::to_policy)
            .unwrap_or_default()
    }

    /// Resolve keyring references, optionally letting `IDRACCTL_*`
    /// environment variables override the stored values
    pub fn resolve(&self, env_overrides: bool) -> Result<ResolvedProfile> {
        let store = CredentialStore::new();
        let env = |var: &'static str| env_overrides.then_some(var);

        let url = store
            .get_credential(&self.url, env(ENV_URL))
            .map_err(|e| ConfigError::CredentialError(format!("url: {}", e)))?;
        let username = store
            .get_credential(&self.username, env(ENV_USERNAME))
            .map_err(|e| ConfigError::CredentialError(format!("username: {}", e)))?;

        let password = match (&self.password, env(ENV_PASSWORD)) {
            (Some(stored), var) => Some(store.get_credential(stored, var)),
            (None, Some(var)) => std::env::var(var).ok().map(Ok),
            (None, None) => None,
        }
        .transpose()
        .map_err(|e| ConfigError::CredentialError(format!("password: {}", e)))?;

        Ok(ResolvedProfile {
            url,
            username,
            password,
            insecure: self.insecure,
            manager_id: self.manager_id.clone(),
            system_id: self.system_id.clone(),
            policy: self.retry_policy(),
        })
    }
}

impl Config {
    /// Pick the profile name to use.
    ///
    /// An explicit name wins, then `default_profile`, then the first profile
    /// by name.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            return Ok(name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'idracctl profile set' to create a profile.".to_string(),
            })
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file is empty
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let config: Config = toml::from_str(&Self::expand_env_vars(&content))?;
        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/idracctl/config.toml
    /// On macOS: ~/.config/idracctl/config.toml when that directory exists,
    /// otherwise ~/Library/Application Support/com.dell.idracctl/config.toml
    /// On Windows: %APPDATA%\dell\idracctl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style = base_dirs.home_dir().join(".config").join("idracctl");
                if linux_style.exists() {
                    return Ok(linux_style.join("config.toml"));
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "dell", "idracctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as written so profiles
    /// that are not in use do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}
