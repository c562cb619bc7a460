use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use idracctl_core::config::{Config, ConfigError, Profile, RetrySettings};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// 1. Missing and empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/idracctl-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file is an empty config");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    assert!(config.profiles.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Corrupt TOML
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[profiles.lab\nurl = ").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn profile_missing_url_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.lab]
username = "root"
"#,
    )
    .unwrap();

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::ParseError(_))
    ));
}

// ---------------------------------------------------------------------------
// 3. Defaults and retry overrides
// ---------------------------------------------------------------------------

#[test]
fn minimal_profile_gets_redfish_ids_and_default_policy() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.lab]
url = "https://10.0.0.20"
username = "root"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let profile = config.profile("lab").unwrap();

    assert_eq!(profile.manager_id, "iDRAC.Embedded.1");
    assert_eq!(profile.system_id, "System.Embedded.1");
    assert!(!profile.insecure);
    assert!(!profile.has_password());

    let policy = profile.retry_policy();
    assert_eq!(policy.apply_attempts, 10);
    assert_eq!(policy.ready_attempts, 96);
}

#[test]
fn partial_retry_table_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.lab]
url = "https://10.0.0.20"
username = "root"

[profiles.lab.retry]
apply_attempts = 3
ready_delay_secs = 2
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let policy = config.profile("lab").unwrap().retry_policy();

    assert_eq!(policy.apply_attempts, 3);
    assert_eq!(policy.ready_delay, Duration::from_secs(2));
    assert_eq!(policy.apply_delay, Duration::from_secs(15));
    assert_eq!(policy.ready_attempts, 96);
}

// ---------------------------------------------------------------------------
// 4. Save and reload
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories_and_reloads() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("deeper").join("config.toml");

    let mut profile = Profile::new("https://10.0.0.20", "root");
    profile.password = Some("keyring:lab-password".to_string());
    profile.retry = Some(RetrySettings {
        apply_attempts: 4,
        ..RetrySettings::default()
    });

    let mut config = Config::default();
    config.set_profile("lab".to_string(), profile.clone());
    config.default_profile = Some("lab".to_string());
    config.save_to_path(&config_path).unwrap();

    let reloaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(reloaded.default_profile.as_deref(), Some("lab"));
    assert_eq!(reloaded.profile("lab").unwrap(), &profile);
}

#[test]
fn unset_password_is_not_written() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.set_profile("lab".to_string(), Profile::new("https://10.0.0.20", "root"));
    config.save_to_path(&config_path).unwrap();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(!content.contains("password"));
    assert!(!content.contains("retry"));
}

// ---------------------------------------------------------------------------
// 5. Profile selection
// ---------------------------------------------------------------------------

#[test]
fn resolve_profile_order() {
    let mut config = Config::default();
    assert!(matches!(
        config.resolve_profile(None),
        Err(ConfigError::NoProfiles { .. })
    ));

    config.set_profile("rack-b".to_string(), Profile::new("https://10.0.0.22", "root"));
    config.set_profile("rack-a".to_string(), Profile::new("https://10.0.0.21", "root"));
    assert_eq!(config.resolve_profile(None).unwrap(), "rack-a");

    config.default_profile = Some("rack-b".to_string());
    assert_eq!(config.resolve_profile(None).unwrap(), "rack-b");
    assert_eq!(config.resolve_profile(Some("other")).unwrap(), "other");
}

#[test]
fn unknown_profile_is_not_found() {
    let config = Config::default();
    assert!(matches!(
        config.profile("missing"),
        Err(ConfigError::ProfileNotFound { name }) if name == "missing"
    ));
}

#[test]
fn removing_default_profile_clears_default() {
    let mut config = Config::default();
    config.set_profile("lab".to_string(), Profile::new("https://10.0.0.20", "root"));
    config.default_profile = Some("lab".to_string());

    assert!(config.remove_profile("lab").is_some());
    assert!(config.default_profile.is_none());
    assert!(config.remove_profile("lab").is_none());
}

// ---------------------------------------------------------------------------
// 6. Resolution without environment overrides
// ---------------------------------------------------------------------------

#[test]
fn resolve_without_env_uses_stored_values() {
    let mut profile = Profile::new("https://10.0.0.20", "root");
    profile.password = Some("calvin".to_string());
    profile.insecure = true;

    let resolved = profile.resolve(false).unwrap();
    assert_eq!(resolved.url, "https://10.0.0.20");
    assert_eq!(resolved.username, "root");
    assert_eq!(resolved.password.as_deref(), Some("calvin"));
    assert!(resolved.insecure);
    assert_eq!(resolved.manager_id, "iDRAC.Embedded.1");
}
