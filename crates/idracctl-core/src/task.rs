//! Task monitor polling
//!
//! Redfish actions that run in the background answer `202 Accepted` with a
//! `Location` pointing at a task monitor. The monitor keeps answering 202
//! while the task runs; the first other answer is the outcome. This module
//! polls that monitor with optional progress callbacks for UI updates.

use std::time::Duration;

use tokio::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{RestResponse, Transport, TransportResult};

/// Progress events emitted while following a task monitor
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// Monitor discovered, polling starts
    Started { monitor: String },
    /// Polling iteration with current state
    Polling {
        monitor: String,
        state: String,
        percent: Option<u64>,
        elapsed: Duration,
    },
    /// Task completed successfully
    Completed { monitor: String },
    /// Task failed
    Failed { monitor: String, error: String },
}

/// Callback type for task progress updates
///
/// The CLI uses this to print progress; library callers typically don't.
pub type TaskCallback = Box<dyn Fn(TaskEvent) + Send + Sync>;

/// A task monitor to poll until completion
#[derive(Debug, Clone)]
pub struct TaskMonitor {
    uri: String,
    interval: Duration,
    timeout: Duration,
}

impl TaskMonitor {
    pub fn new(uri: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            uri: uri.into(),
            interval,
            timeout,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Poll the monitor until it stops answering 202.
    ///
    /// # Returns
    ///
    /// The final response, or an error if the monitor reported a failed task,
    /// answered with an error status, or the timeout elapsed.
    pub async fn wait<T: Transport + ?Sized>(
        &self,
        transport: &T,
        on_progress: Option<&TaskCallback>,
    ) -> TransportResult<RestResponse> {
        let start = Instant::now();

        emit(
            on_progress,
            TaskEvent::Started {
                monitor: self.uri.clone(),
            },
        );

        loop {
            let elapsed = start.elapsed();
            if elapsed > self.timeout {
                return Err(TransportError::Timeout(format!(
                    "task monitor {} still running after {:?}",
                    self.uri, self.timeout
                )));
            }

            let response = transport.get(&self.uri).await?;
            let state = task_state(response.body.as_ref()).unwrap_or_default();

            emit(
                on_progress,
                TaskEvent::Polling {
                    monitor: self.uri.clone(),
                    state: state.clone(),
                    percent: response
                        .body
                        .as_ref()
                        .and_then(|b| b.get("PercentComplete"))
                        .and_then(Value::as_u64),
                    elapsed,
                },
            );

            if response.status == 202 {
                tokio::time::sleep(self.interval).await;
                continue;
            }

            // Check for terminal states (case-insensitive)
            match state.to_lowercase().as_str() {
                "exception" | "killed" | "cancelled" | "failed" => {
                    let error = task_message(response.body.as_ref())
                        .unwrap_or_else(|| format!("Task ended in state {}", state));
                    emit(
                        on_progress,
                        TaskEvent::Failed {
                            monitor: self.uri.clone(),
                            error: error.clone(),
                        },
                    );
                    return Err(TransportError::TaskFailed {
                        message: error,
                        body: response.body,
                    });
                }
                "new" | "starting" | "running" | "pending" | "suspended" | "interrupted"
                | "stopping" | "cancelling" | "service" => {
                    debug!(monitor = %self.uri, state, "task still in progress");
                    tokio::time::sleep(self.interval).await;
                }
                _ => {
                    emit(
                        on_progress,
                        TaskEvent::Completed {
                            monitor: self.uri.clone(),
                        },
                    );
                    return Ok(response);
                }
            }
        }
    }
}

fn task_state(body: Option<&Value>) -> Option<String> {
    body?
        .get("TaskState")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn task_message(body: Option<&Value>) -> Option<String> {
    body?
        .get("Messages")
        .and_then(Value::as_array)
        .and_then(|m| m.first())
        .and_then(|m| m.get("Message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Helper to emit progress events
fn emit(callback: Option<&TaskCallback>, event: TaskEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
