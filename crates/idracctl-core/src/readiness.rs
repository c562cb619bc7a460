//! Controller readiness polling
//!
//! After a reset the controller answers HTTP long before its Lifecycle
//! Controller can take jobs. `GetRemoteServicesAPIStatus` reports `LCStatus`
//! once it can.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::error::{CoreError, Result, TransportError};
use crate::transport::Transport;

/// Field whose presence in the status body means the controller is ready
const READY_INDICATOR: &str = "LCStatus";

/// Result of one probe
#[derive(Debug)]
pub enum ProbeOutcome {
    Ready(Value),
    /// Answered without the indicator
    NotReady,
    /// Transport failure, counted as not ready yet
    Unreachable(TransportError),
}

/// Result of a whole wait
#[derive(Debug)]
pub enum ReadinessResult {
    /// Status body that carried the indicator
    Ready { status: Value, probes: u32 },
    /// Every probe failed; the last transport failure, if any, is kept
    NotReady {
        probes: u32,
        last_error: Option<TransportError>,
    },
}

impl ReadinessResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessResult::Ready { .. })
    }

    /// Surface exhaustion as a connection failure
    pub fn into_result(self) -> Result<Value> {
        match self {
            ReadinessResult::Ready { status, .. } => Ok(status),
            ReadinessResult::NotReady { probes, last_error } => Err(CoreError::Connection {
                message: format!("controller not ready after {} probes", probes),
                source: last_error,
            }),
        }
    }
}

/// Polls the remote services status action until the controller is ready
pub struct ReadinessPoller<'a, T: Transport + ?Sized> {
    transport: &'a T,
    status_uri: &'a str,
    attempts: u32,
    delay: Duration,
}

impl<'a, T: Transport + ?Sized> ReadinessPoller<'a, T> {
    pub fn new(transport: &'a T, status_uri: &'a str, attempts: u32, delay: Duration) -> Self {
        Self {
            transport,
            status_uri,
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Send one probe.
    ///
    /// A restarting controller answers 401, 404 or nothing at all for a
    /// while, so every transport failure is `Unreachable`.
    pub async fn probe(&self) -> ProbeOutcome {
        match self.transport.post(self.status_uri, &json!({})).await {
            Ok(response) => match response.body {
                Some(body) if body.get(READY_INDICATOR).is_some() => ProbeOutcome::Ready(body),
                _ => ProbeOutcome::NotReady,
            },
            Err(err) => ProbeOutcome::Unreachable(err),
        }
    }

    /// Probe up to the attempt budget with a fixed delay between probes
    pub async fn await_ready(&self) -> ReadinessResult {
        let mut last_error = None;

        for probe in 1..=self.attempts {
            match self.probe().await {
                ProbeOutcome::Ready(status) => {
                    info!(probes = probe, "Controller is ready");
                    return ReadinessResult::Ready {
                        status,
                        probes: probe,
                    };
                }
                ProbeOutcome::NotReady => {
                    debug!(probe, "Controller answered but is not ready yet");
                }
                ProbeOutcome::Unreachable(err) => {
                    debug!(probe, error = %err, "Controller unreachable");
                    last_error = Some(err);
                }
            }

            if probe < self.attempts {
                warn!(attempts_left = self.attempts - probe, "Controller not ready, retrying");
                tokio::time::sleep(self.delay).await;
            }
        }

        error!(probes = self.attempts, "Controller did not become ready");
        ReadinessResult::NotReady {
            probes: self.attempts,
            last_error,
        }
    }
}
