//! Command implementations

use std::time::Duration;

use idracctl_core::{TaskCallback, TaskEvent};
use indicatif::{ProgressBar, ProgressStyle};

pub mod boot;
pub mod controller;
pub mod jobs;
pub mod profile;

/// Spinner on stderr; hidden when stderr is not a terminal
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Task monitor progress routed to `pb`
pub fn task_progress(pb: &ProgressBar) -> TaskCallback {
    let pb = pb.clone();
    Box::new(move |event: TaskEvent| match event {
        TaskEvent::Started { monitor } => {
            pb.set_message(format!("Task {} started", short_task(&monitor)));
        }
        TaskEvent::Polling {
            monitor,
            state,
            percent,
            elapsed,
        } => {
            let percent = percent.map(|p| format!(" {}%", p)).unwrap_or_default();
            pb.set_message(format!(
                "Task {}: {}{} ({:.0}s)",
                short_task(&monitor),
                state,
                percent,
                elapsed.as_secs_f64()
            ));
        }
        TaskEvent::Completed { monitor } => {
            pb.set_message(format!("Task {} completed", short_task(&monitor)));
        }
        TaskEvent::Failed { monitor, error } => {
            pb.set_message(format!("Task {} failed: {}", short_task(&monitor), error));
        }
    })
}

fn short_task(monitor: &str) -> &str {
    monitor.rsplit('/').next().unwrap_or(monitor)
}
