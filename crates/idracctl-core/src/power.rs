//! Managed system power control
//!
//! A configuration job that is pending on the controller only runs during the
//! next system POST, and it blocks any further import until then. Forcing the
//! system off and back on is the way out.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::policy::RetryPolicy;
use crate::transport::Transport;

/// Power state of the managed system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
    Unknown,
}

impl PowerState {
    /// Map a Redfish `PowerState` value
    pub fn from_redfish(value: &str) -> Self {
        match value {
            "On" => PowerState::On,
            "Off" => PowerState::Off,
            "PoweringOn" => PowerState::PoweringOn,
            "PoweringOff" => PowerState::PoweringOff,
            _ => PowerState::Unknown,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "On"),
            PowerState::Off => write!(f, "Off"),
            PowerState::PoweringOn => write!(f, "PoweringOn"),
            PowerState::PoweringOff => write!(f, "PoweringOff"),
            PowerState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// `ResetType` values accepted by `ComputerSystem.Reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    On,
    ForceOff,
}

impl ResetType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResetType::On => "On",
            ResetType::ForceOff => "ForceOff",
        }
    }
}

/// The server whose configuration is being applied
///
/// Only what the recovery path needs: read the power state, request a
/// transition.
#[async_trait]
pub trait ManagedSystem: Send + Sync {
    async fn power_state(&self) -> Result<PowerState>;

    async fn reset(&self, reset_type: ResetType) -> Result<()>;
}

/// Force the system off, wait for it, power it on, wait again.
///
/// Each wait polls every `power_poll_interval` and gives up after
/// `power_poll_attempts` intervals with [`CoreError::PowerTransitionTimeout`].
pub async fn power_cycle<S: ManagedSystem + ?Sized>(system: &S, policy: &RetryPolicy) -> Result<()> {
    if system.power_state().await? != PowerState::Off {
        system.reset(ResetType::ForceOff).await?;
        info!("Requested system power off");
        wait_for_state(system, PowerState::Off, policy).await?;
    }
    info!("System is powered off");

    system.reset(ResetType::On).await?;
    info!("Requested system power on");
    wait_for_state(system, PowerState::On, policy).await?;
    info!("System is powered on");

    Ok(())
}

async fn wait_for_state<S: ManagedSystem + ?Sized>(
    system: &S,
    target: PowerState,
    policy: &RetryPolicy,
) -> Result<()> {
    for polled in 0..=policy.power_poll_attempts {
        if polled > 0 {
            tokio::time::sleep(policy.power_poll_interval).await;
        }
        let state = system.power_state().await?;
        if state == target {
            return Ok(());
        }
        debug!(current = %state, target = %target, polled, "waiting for power transition");
    }

    Err(CoreError::PowerTransitionTimeout {
        target,
        waited: policy.power_poll_interval * policy.power_poll_attempts,
    })
}

/// [`ManagedSystem`] backed by a Redfish `ComputerSystem` resource
#[derive(Debug)]
pub struct RedfishSystem<T> {
    transport: T,
    system_uri: String,
    reset_uri: String,
}

impl<T: Transport> RedfishSystem<T> {
    /// Use the conventional reset target under `system_uri`
    pub fn new(transport: T, system_uri: impl Into<String>) -> Self {
        let system_uri = system_uri.into();
        let reset_uri = format!(
            "{}/Actions/ComputerSystem.Reset",
            system_uri.trim_end_matches('/')
        );
        Self {
            transport,
            system_uri,
            reset_uri,
        }
    }

    /// Override the reset action target, e.g. one read from the resource
    pub fn with_reset_uri(mut self, reset_uri: impl Into<String>) -> Self {
        self.reset_uri = reset_uri.into();
        self
    }

    pub fn system_uri(&self) -> &str {
        &self.system_uri
    }

    pub fn reset_uri(&self) -> &str {
        &self.reset_uri
    }

    async fn system(&self) -> Result<Value> {
        let response = self
            .transport
            .get(&self.system_uri)
            .await
            .map_err(|e| CoreError::remote("read system resource", e))?;
        Ok(response.body.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl<T: Transport> ManagedSystem for RedfishSystem<T> {
    async fn power_state(&self) -> Result<PowerState> {
        let system = self.system().await?;
        Ok(system
            .get("PowerState")
            .and_then(Value::as_str)
            .map(PowerState::from_redfish)
            .unwrap_or(PowerState::Unknown))
    }

    async fn reset(&self, reset_type: ResetType) -> Result<()> {
        self.transport
            .post(&self.reset_uri, &json!({ "ResetType": reset_type.as_str() }))
            .await
            .map_err(|e| CoreError::remote(format!("system reset ({})", reset_type.as_str()), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// System that reaches the requested state after `lag` more reads
    struct LaggingSystem {
        lag: u32,
        inner: Mutex<LagState>,
    }

    struct LagState {
        state: PowerState,
        pending: Option<(PowerState, u32)>,
        resets: Vec<ResetType>,
    }

    impl LaggingSystem {
        fn new(state: PowerState, lag: u32) -> Self {
            Self {
                lag,
                inner: Mutex::new(LagState {
                    state,
                    pending: None,
                    resets: Vec::new(),
                }),
            }
        }

        fn resets(&self) -> Vec<ResetType> {
            self.inner.lock().unwrap().resets.clone()
        }
    }

    #[async_trait]
    impl ManagedSystem for LaggingSystem {
        async fn power_state(&self) -> Result<PowerState> {
            let mut inner = self.inner.lock().unwrap();
            if let Some((target, left)) = inner.pending {
                if left == 0 {
                    inner.state = target;
                    inner.pending = None;
                } else {
                    inner.pending = Some((target, left - 1));
                }
            }
            Ok(inner.state)
        }

        async fn reset(&self, reset_type: ResetType) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.resets.push(reset_type);
            let target = match reset_type {
                ResetType::On => PowerState::On,
                ResetType::ForceOff => PowerState::Off,
            };
            inner.pending = Some((target, self.lag));
            Ok(())
        }
    }

    /// System stuck in one state regardless of requests
    struct Stuck(PowerState);

    #[async_trait]
    impl ManagedSystem for Stuck {
        async fn power_state(&self) -> Result<PowerState> {
            Ok(self.0)
        }

        async fn reset(&self, _reset_type: ResetType) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_power_state_from_redfish() {
        assert_eq!(PowerState::from_redfish("On"), PowerState::On);
        assert_eq!(PowerState::from_redfish("Off"), PowerState::Off);
        assert_eq!(PowerState::from_redfish("PoweringOff"), PowerState::PoweringOff);
        assert_eq!(PowerState::from_redfish("bogus"), PowerState::Unknown);
        assert_eq!(PowerState::PoweringOn.to_string(), "PoweringOn");
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_cycle_from_on() {
        let system = LaggingSystem::new(PowerState::On, 2);
        let policy = RetryPolicy::default();

        let start = tokio::time::Instant::now();
        power_cycle(&system, &policy).await.unwrap();

        assert_eq!(system.resets(), vec![ResetType::ForceOff, ResetType::On]);
        // Two polling intervals for each transition
        assert_eq!(start.elapsed(), policy.power_poll_interval * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_cycle_when_already_off() {
        let system = LaggingSystem::new(PowerState::Off, 0);
        let policy = RetryPolicy::default();

        let start = tokio::time::Instant::now();
        power_cycle(&system, &policy).await.unwrap();

        assert_eq!(system.resets(), vec![ResetType::On]);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_wait_is_bounded() {
        let policy = RetryPolicy::default();

        let start = tokio::time::Instant::now();
        let err = power_cycle(&Stuck(PowerState::On), &policy).await.unwrap_err();

        match err {
            CoreError::PowerTransitionTimeout { target, waited } => {
                assert_eq!(target, PowerState::Off);
                assert_eq!(waited, Duration::from_secs(600));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(start.elapsed(), Duration::from_secs(600));
    }
}
