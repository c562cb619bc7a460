//! Job queue commands

use comfy_table::Table;
use idracctl_core::{JobRecord, JobSelection};
use serde_json::json;
use tracing::debug;

use crate::cli::{JobsCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::output;

pub async fn handle_jobs_command(
    cmd: &JobsCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let manager = conn_mgr.connect(profile, None).await?;

    match cmd {
        JobsCommands::List { unfinished } => {
            let jobs = if *unfinished {
                manager.unfinished_jobs().await?
            } else {
                manager.list_jobs().await?
            };
            debug!("Found {} jobs", jobs.len());

            match output_format {
                OutputFormat::Table => print_jobs_table(&jobs),
                _ => output::print_output(&jobs, output_format)?,
            }
        }
        JobsCommands::Clear { job_ids } => {
            let selection = JobSelection::from(job_ids.clone());
            let responses = manager.clear_job_queue(&selection).await?;

            match output_format {
                OutputFormat::Table => match &selection {
                    JobSelection::All => println!("Job queue cleared"),
                    JobSelection::Ids(ids) => println!("Deleted {} job(s)", ids.len()),
                },
                _ => {
                    let data = json!({
                        "deleted": selection.job_ids(),
                        "statuses": responses.iter().map(|r| r.status).collect::<Vec<_>>(),
                    });
                    output::print_output(&data, output_format)?;
                }
            }
        }
    }
    Ok(())
}

fn print_jobs_table(jobs: &[JobRecord]) {
    if jobs.is_empty() {
        println!("No jobs.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "STATE", "PERCENT", "NAME", "MESSAGE"]);
    for job in jobs {
        table.add_row(vec![
            job.id.clone(),
            job.state.to_string(),
            job.percent_complete
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "-".to_string()),
            job.name.clone().unwrap_or_default(),
            job.message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}
