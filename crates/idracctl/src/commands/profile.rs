//! Profile management command implementations

use std::io::{self, Write};

use anyhow::Context;
use colored::Colorize;
use comfy_table::Table;
use idracctl_core::config::{Config, CredentialStore, Profile};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result};
use crate::output;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            url,
            username,
            password,
            ask_password,
            insecure,
            manager_id,
            system_id,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let password = match (password, ask_password) {
                (Some(p), _) => Some(p.clone()),
                (None, true) => Some(
                    rpassword::prompt_password("Password: ").context("Failed to read password")?,
                ),
                (None, false) => None,
            };

            let mut profile = Profile::new(url, username);
            profile.password = password;
            profile.insecure = *insecure;
            profile.manager_id = manager_id.clone();
            profile.system_id = system_id.clone();

            #[cfg(feature = "secure-storage")]
            let store_in_keyring = *use_keyring;
            #[cfg(not(feature = "secure-storage"))]
            let store_in_keyring = false;

            handle_set(conn_mgr, name, profile, store_in_keyring)
        }
        Remove { name, force } => handle_remove(conn_mgr, name, *force),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_location(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
        .map(|p| p.display().to_string())
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let profiles = conn_mgr.config.list_profiles();
    let default = conn_mgr.config.default_profile.as_deref();
    debug!("Found {} profiles", profiles.len());

    match output_format {
        OutputFormat::Table => {
            if let Some(path) = config_location(conn_mgr) {
                println!("Configuration file: {}", path);
                println!();
            }

            if profiles.is_empty() {
                info!("No profiles configured");
                println!("No profiles configured.");
                println!("Use 'idracctl profile set' to create a profile.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["NAME", "URL", "USERNAME", "INSECURE", "DEFAULT"]);
            for (name, profile) in &profiles {
                table.add_row(vec![
                    name.to_string(),
                    profile.url.clone(),
                    profile.username.clone(),
                    profile.insecure.to_string(),
                    if default == Some(name.as_str()) { "*" } else { "" }.to_string(),
                ]);
            }
            println!("{}", table);
        }
        _ => {
            let profile_list: Vec<serde_json::Value> = profiles
                .iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "url": profile.url,
                        "username": profile.username,
                        "insecure": profile.insecure,
                        "is_default": default == Some(name.as_str()),
                    })
                })
                .collect();

            let data = json!({
                "config_path": config_location(conn_mgr),
                "profiles": profile_list,
                "count": profiles.len(),
            });
            output::print_output(&data, output_format)?;
        }
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match output_format {
        OutputFormat::Table => println!("{}", config_path.display()),
        _ => output::print_output(
            json!({ "config_path": config_path.display().to_string() }),
            output_format,
        )?,
    }
    Ok(())
}

fn handle_show(conn_mgr: &ConnectionManager, name: &str, output_format: OutputFormat) -> Result<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let policy = profile.retry_policy();

    match output_format {
        OutputFormat::Table => {
            println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
            println!("URL: {}", profile.url);
            println!("Username: {}", profile.username);
            let password = match &profile.password {
                Some(p) if CredentialStore::is_keyring_reference(p) => "keyring",
                Some(_) => "configured",
                None => "not set",
            };
            println!("Password: {}", password);
            println!("Insecure: {}", profile.insecure);
            println!("Manager: {}", profile.manager_id);
            println!("System: {}", profile.system_id);
            println!(
                "Apply: {} attempts, {:?} apart",
                policy.apply_attempts, policy.apply_delay
            );
            println!(
                "Readiness: {} probes, {:?} apart",
                policy.ready_attempts, policy.ready_delay
            );
        }
        _ => {
            let data = json!({
                "name": name,
                "url": profile.url,
                "username": profile.username,
                "password_configured": profile.has_password(),
                "insecure": profile.insecure,
                "manager_id": profile.manager_id,
                "system_id": profile.system_id,
                "is_default": is_default,
                "retry": {
                    "apply_attempts": policy.apply_attempts,
                    "apply_delay_secs": policy.apply_delay.as_secs(),
                    "ready_attempts": policy.ready_attempts,
                    "ready_delay_secs": policy.ready_delay.as_secs(),
                    "power_poll_interval_secs": policy.power_poll_interval.as_secs(),
                    "power_poll_attempts": policy.power_poll_attempts,
                },
            });
            output::print_output(&data, output_format)?;
        }
    }
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    mut profile: Profile,
    store_in_keyring: bool,
) -> Result<()> {
    debug!("Setting profile: {}", name);
    let mut config = conn_mgr.config.clone();

    // Retry overrides are only edited in the file; keep them across updates
    if let Some(existing) = config.profiles.get(name) {
        profile.retry = existing.retry.clone();
        println!("Updating existing profile '{}'.", name);
    }

    if store_in_keyring && let Some(password) = profile.password.take() {
        let store = CredentialStore::new();
        let reference = store
            .store_credential(&format!("{}-password", name), &password)
            .context("Failed to store password in keyring")?;
        println!("Password stored securely in OS keyring");
        profile.password = Some(reference);
    }

    config.set_profile(name.to_string(), profile);
    if config.default_profile.is_none() {
        config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' saved.", name);
    if config.default_profile.as_deref() == Some(name) {
        println!("'{}' is the default profile.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, force: bool) -> Result<()> {
    debug!("Removing profile: {}", name);
    let profile = conn_mgr.config.profile(name)?;

    if !force {
        print!(
            "Are you sure you want to remove profile '{}'? (y/N): ",
            name
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Profile removal cancelled.");
            return Ok(());
        }
    }

    if let Some(password) = &profile.password {
        CredentialStore::new()
            .delete_credential(password)
            .context("Failed to remove keyring entry")?;
    }

    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);
    config.remove_profile(name);
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed.", name);
    if was_default {
        println!("{}", "Default profile cleared.".yellow());
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> Result<()> {
    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(CliError::ProfileNotFound {
            name: name.to_string(),
        });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}
