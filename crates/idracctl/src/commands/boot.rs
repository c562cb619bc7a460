//! Virtual media boot override

use idracctl_core::{MediaKind, VirtualMediaType};
use serde_json::json;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::commands::{spinner, task_progress};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result};
use crate::output;

pub async fn handle_boot_device(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    device: VirtualMediaType,
    persistent: bool,
    output_format: OutputFormat,
) -> Result<()> {
    // Refuse devices without a bundle before touching the network
    MediaKind::try_from(device)?;

    let pb = spinner(format!("Setting boot device to {}", device));
    let result = async {
        let manager = conn_mgr.connect(profile, Some(task_progress(&pb))).await?;
        debug!(import = %manager.endpoints().import_system_configuration, "import target");
        Ok::<_, CliError>(manager.apply_boot_device_config(device, persistent).await?)
    }
    .await;
    pb.finish_and_clear();
    let outcome = result?;

    match output_format {
        OutputFormat::Table => {
            println!(
                "Boot device set to {} ({})",
                device,
                if persistent { "persistent" } else { "next boot only" }
            );
            if let Some(job_id) = outcome.job_id() {
                println!("  Job: {}", job_id);
            }
            if outcome.retries > 0 {
                println!("  Accepted after {} retries", outcome.retries);
            }
        }
        _ => {
            let data = json!({
                "device": device,
                "persistent": persistent,
                "status": outcome.response.status,
                "job_id": outcome.job_id(),
                "retries": outcome.retries,
            });
            output::print_output(&data, output_format)?;
        }
    }
    Ok(())
}
