use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test command isolated from the caller's environment
fn idracctl() -> Command {
    let mut cmd = Command::cargo_bin("idracctl").unwrap();
    cmd.env_remove("IDRACCTL_PROFILE")
        .env_remove("IDRACCTL_CONFIG_FILE")
        .env_remove("IDRACCTL_URL")
        .env_remove("IDRACCTL_USERNAME")
        .env_remove("IDRACCTL_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn with_config(config: &Path) -> Command {
    let mut cmd = idracctl();
    cmd.arg("--config-file").arg(config);
    cmd
}

fn set_lab_profile(config: &Path, url: &str) {
    with_config(config)
        .args(["profile", "set", "lab", "--url", url, "--username", "root"])
        .args(["--password", "calvin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' saved."));
}

#[test]
fn test_help_flag() {
    idracctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dell iDRAC configuration CLI"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    idracctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("idracctl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    let output = idracctl()
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["name"], "idracctl");
}

#[test]
fn test_no_args_shows_help() {
    idracctl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    idracctl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_boot_device_rejects_unknown_value() {
    idracctl()
        .args(["boot-device", "Tape"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_boot_device_dvd_has_no_bundle() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    with_config(&config)
        .args(["boot-device", "DVD"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_profile_list_empty() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    with_config(&config)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured."));
}

#[test]
fn test_controller_command_without_profile() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    with_config(&config)
        .args(["jobs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No profile configured"));
}

#[test]
fn test_profile_lifecycle() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    set_lab_profile(&config, "https://10.0.0.20");

    let output = with_config(&config)
        .args(["profile", "show", "lab", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let shown: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(shown["url"], "https://10.0.0.20");
    assert_eq!(shown["password_configured"], true);
    assert_eq!(shown["is_default"], true);
    assert_eq!(shown["manager_id"], "iDRAC.Embedded.1");
    assert_eq!(shown["retry"]["apply_attempts"], 10);

    let output = with_config(&config)
        .args(["profile", "list", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(listed["count"], 1);

    with_config(&config)
        .args(["profile", "remove", "lab", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default profile cleared."));

    with_config(&config)
        .args(["profile", "show", "lab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'lab' not found"));
}

#[test]
fn test_profile_remove_cancelled() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    set_lab_profile(&config, "https://10.0.0.20");

    with_config(&config)
        .args(["profile", "remove", "lab"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));

    with_config(&config)
        .args(["profile", "show", "lab"])
        .assert()
        .success();
}

#[test]
fn test_profile_default_unknown() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    with_config(&config)
        .args(["profile", "default", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_profile_path_honours_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");

    with_config(&config)
        .args(["profile", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_jobs_list_against_controller() {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": "iDRAC.Embedded.1",
            "Actions": {
                "#Manager.Reset": {"target": "/redfish/v1/Managers/iDRAC.Embedded.1/Actions/Manager.Reset"},
                "Oem": {
                    "#OemManager.ImportSystemConfiguration": {
                        "target": "/redfish/v1/Managers/iDRAC.Embedded.1/Actions/Oem/EID_674_Manager.ImportSystemConfiguration"
                    }
                }
            },
            "Links": {"Oem": {"Dell": {
                "DellJobService": {"@odata.id": "/redfish/v1/Dell/Managers/iDRAC.Embedded.1/DellJobService"},
                "DellLCService": {"@odata.id": "/redfish/v1/Dell/Managers/iDRAC.Embedded.1/DellLCService"}
            }}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Members": [
                {"Id": "JID_1", "JobState": "Running", "PercentComplete": 40},
                {"Id": "JID_2", "JobState": "Completed"}
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    set_lab_profile(&config, &server.uri());

    let output = with_config(&config)
        .args(["jobs", "list", "--unfinished", "-o", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let jobs: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(jobs.as_array().unwrap().len(), 1);
    assert_eq!(jobs[0]["Id"], "JID_1");
    assert_eq!(jobs[0]["PercentComplete"], 40);
}
