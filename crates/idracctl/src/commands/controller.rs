//! Controller reset and readiness commands

use serde_json::json;
use tracing::info;

use crate::cli::OutputFormat;
use crate::commands::spinner;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::output;

pub async fn handle_reset(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    wait: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let manager = conn_mgr.connect(profile, None).await?;
    let response = manager.reset_controller().await?;

    if wait {
        let pb = spinner("Waiting for the Lifecycle Controller");
        let ready = manager.await_controller_ready().await;
        pb.finish_and_clear();
        ready?;
    }

    report(
        output_format,
        if wait {
            "Controller restarted and ready"
        } else {
            "Controller reset requested"
        },
        json!({ "reset_status": response.status, "ready": wait }),
    )
}

pub async fn handle_wait_ready(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let manager = conn_mgr.connect(profile, None).await?;

    let pb = spinner("Waiting for the Lifecycle Controller");
    let ready = manager.await_controller_ready().await;
    pb.finish_and_clear();
    ready?;

    report(
        output_format,
        "Lifecycle Controller is ready",
        json!({ "ready": true }),
    )
}

pub async fn handle_known_good_state(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let manager = conn_mgr.connect(profile, None).await?;

    let pb = spinner("Clearing jobs and restarting the controller");
    let state = manager.restore_known_good_state().await;
    pb.finish_and_clear();
    let state = state?;
    info!(cleared = state.cleared.len(), "known good state restored");

    report(
        output_format,
        "Job queue cleared, controller restarted and ready",
        json!({
            "cleared": state.cleared.len(),
            "reset_status": state.reset.status,
            "ready": true,
        }),
    )
}

fn report(output_format: OutputFormat, message: &str, data: serde_json::Value) -> Result<()> {
    match output_format {
        OutputFormat::Table => {
            println!("{}", message);
            Ok(())
        }
        _ => output::print_output(&data, output_format),
    }
}
