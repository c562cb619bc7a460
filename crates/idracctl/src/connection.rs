//! Connection management for iDRAC controllers

use std::path::PathBuf;

use anyhow::Context;
use idracctl_core::config::{Config, ENV_PASSWORD, ENV_URL, ENV_USERNAME, Profile, ResolvedProfile};
use idracctl_core::{DellManager, HttpTransport, HttpTransportConfig, TaskCallback};
use tracing::{debug, info, trace};

use crate::error::Result as CliResult;

/// Builds authenticated controller handles from profiles
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save `config` to the file this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve connection settings for `profile_name`.
    ///
    /// With an explicit `--config-file` the `IDRACCTL_*` variables are
    /// ignored. Otherwise they override the profile, and with no profiles at
    /// all `IDRACCTL_URL` plus `IDRACCTL_USERNAME` are enough on their own.
    pub fn resolve(&self, profile_name: Option<&str>) -> CliResult<ResolvedProfile> {
        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );

        if use_env_vars
            && profile_name.is_none()
            && self.config.profiles.is_empty()
            && let (Ok(url), Ok(username)) = (std::env::var(ENV_URL), std::env::var(ENV_USERNAME))
        {
            info!("Using controller credentials from environment variables");
            let mut profile = Profile::new(url, username);
            profile.password = std::env::var(ENV_PASSWORD).ok();
            return Ok(profile.resolve(false)?);
        }

        let name = self.config.resolve_profile(profile_name)?;
        info!("Using profile: {}", name);
        let resolved = self.config.profile(&name)?.resolve(use_env_vars)?;
        trace!(url = %resolved.url, username = %resolved.username, "profile resolved");
        Ok(resolved)
    }

    /// Connect to the controller and discover its endpoints
    pub async fn connect(
        &self,
        profile_name: Option<&str>,
        on_task: Option<TaskCallback>,
    ) -> CliResult<DellManager<HttpTransport>> {
        let resolved = self.resolve(profile_name)?;

        let mut transport_config = HttpTransportConfig::new(&resolved.url, &resolved.username)
            .with_insecure(resolved.insecure)
            .with_task_polling(
                resolved.policy.task_poll_interval,
                resolved.policy.task_timeout,
            );
        if let Some(password) = &resolved.password {
            transport_config = transport_config.with_password(password);
        }

        let mut transport = HttpTransport::new(transport_config)?;
        if let Some(callback) = on_task {
            transport = transport.with_task_callback(callback);
        }
        let base = transport.base_url().clone();

        debug!(manager = %resolved.manager_id, system = %resolved.system_id, "discovering endpoints");
        let manager = DellManager::discover(
            transport,
            &base,
            &resolved.manager_id,
            &resolved.system_id,
            resolved.policy,
        )
        .await?;
        Ok(manager)
    }
}
