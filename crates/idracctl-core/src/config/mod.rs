//! Configuration and profile management
//!
//! Named profiles describe how to reach one controller: base URL,
//! credentials, the manager and system ids, and optional retry overrides.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod retry;

pub use config::{Config, ENV_PASSWORD, ENV_URL, ENV_USERNAME, Profile, ResolvedProfile};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use retry::RetrySettings;
