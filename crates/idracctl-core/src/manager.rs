//! Dell manager facade
//!
//! Ties the transport, discovered endpoints and retry policy together and
//! exposes the workflows callers actually run.
//!
//! # Example
//!
//! ```rust,no_run
//! use idracctl_core::{DellManager, HttpTransport, HttpTransportConfig, RetryPolicy, VirtualMediaType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(
//!     HttpTransportConfig::new("https://10.0.0.20", "root").with_password("calvin"),
//! )?;
//! let base = transport.base_url().clone();
//! let manager = DellManager::discover(
//!     transport,
//!     &base,
//!     "iDRAC.Embedded.1",
//!     "System.Embedded.1",
//!     RetryPolicy::default(),
//! )
//! .await?;
//!
//! manager.restore_known_good_state().await?;
//! let outcome = manager.apply_boot_device_config(VirtualMediaType::Cd, false).await?;
//! println!("accepted after {} retries", outcome.retries);
//! # Ok(())
//! # }
//! ```

use serde_json::{Value, json};
use tracing::info;
use url::Url;

use crate::apply::{ApplyOutcome, ConfigApplyController};
use crate::bundle::VirtualMediaType;
use crate::error::{CoreError, Result};
use crate::jobs::{JobQueue, JobRecord, JobSelection};
use crate::policy::RetryPolicy;
use crate::power::RedfishSystem;
use crate::readiness::ReadinessPoller;
use crate::resource::ManagerEndpoints;
use crate::transport::{RestResponse, Transport, resolve_uri};

/// Responses collected by [`DellManager::restore_known_good_state`]
#[derive(Debug, Clone, PartialEq)]
pub struct KnownGoodState {
    pub cleared: Vec<RestResponse>,
    pub reset: RestResponse,
}

/// One iDRAC and the server it manages
pub struct DellManager<T: Transport> {
    transport: T,
    endpoints: ManagerEndpoints,
    system_uri: String,
    policy: RetryPolicy,
}

impl<T: Transport> DellManager<T> {
    pub fn new(
        transport: T,
        endpoints: ManagerEndpoints,
        system_uri: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            endpoints,
            system_uri: system_uri.into(),
            policy,
        }
    }

    /// Read the manager resource and discover the endpoints from it
    pub async fn discover(
        transport: T,
        base: &Url,
        manager_id: &str,
        system_id: &str,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let manager_uri = format!("/redfish/v1/Managers/{}", manager_id);
        let manager = transport
            .get(&manager_uri)
            .await
            .map_err(|e| CoreError::remote("read manager resource", e))?
            .body
            .unwrap_or(Value::Null);

        let endpoints = ManagerEndpoints::from_manager_json(base, &manager)?;
        let system_uri = resolve_uri(base, &format!("/redfish/v1/Systems/{}", system_id))
            .map_err(|e| CoreError::InvalidParameter(e.to_string()))?;

        Ok(Self::new(transport, endpoints, system_uri, policy))
    }

    pub fn endpoints(&self) -> &ManagerEndpoints {
        &self.endpoints
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Boot from virtual media, next boot only unless `persistent`
    pub async fn apply_boot_device_config(
        &self,
        device: VirtualMediaType,
        persistent: bool,
    ) -> Result<ApplyOutcome> {
        let system = RedfishSystem::new(&self.transport, self.system_uri.as_str());
        ConfigApplyController::new(
            &self.transport,
            &self.endpoints.import_system_configuration,
            &self.endpoints.identity,
            &self.policy,
        )
        .apply(device, persistent, &system)
        .await
    }

    pub async fn clear_job_queue(&self, selection: &JobSelection) -> Result<Vec<RestResponse>> {
        let delete_uri = self.endpoints.delete_job_queue_uri();
        let jobs_uri = self.endpoints.jobs_uri();
        JobQueue::new(&self.transport, &delete_uri, &jobs_uri)
            .clear(selection)
            .await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let delete_uri = self.endpoints.delete_job_queue_uri();
        let jobs_uri = self.endpoints.jobs_uri();
        JobQueue::new(&self.transport, &delete_uri, &jobs_uri)
            .list()
            .await
    }

    pub async fn unfinished_jobs(&self) -> Result<Vec<JobRecord>> {
        let delete_uri = self.endpoints.delete_job_queue_uri();
        let jobs_uri = self.endpoints.jobs_uri();
        JobQueue::new(&self.transport, &delete_uri, &jobs_uri)
            .unfinished()
            .await
    }

    /// Gracefully restart the controller; does not wait for it
    pub async fn reset_controller(&self) -> Result<RestResponse> {
        let response = self
            .transport
            .post(&self.endpoints.reset, &json!({ "ResetType": "GracefulRestart" }))
            .await
            .map_err(|e| CoreError::remote("controller reset", e))?;
        info!("Controller reset requested, it will be unavailable for a while");
        Ok(response)
    }

    /// Wait until the Lifecycle Controller accepts jobs again.
    ///
    /// `Ok(())` means the controller reported ready. Running out of probes is
    /// [`CoreError::Connection`] carrying the last transport failure, so there
    /// is no "not ready" success value. Use [`ReadinessPoller`] directly for
    /// the probe count and status body.
    pub async fn await_controller_ready(&self) -> Result<()> {
        let status_uri = self.endpoints.remote_api_status_uri();
        ReadinessPoller::new(
            &self.transport,
            &status_uri,
            self.policy.ready_attempts,
            self.policy.ready_delay,
        )
        .await_ready()
        .await
        .into_result()
        .map(|_| ())
    }

    /// Clear every job, restart the controller, and wait for it.
    ///
    /// A failed clear leaves the controller untouched.
    pub async fn restore_known_good_state(&self) -> Result<KnownGoodState> {
        let cleared = self.clear_job_queue(&JobSelection::All).await?;
        let reset = self.reset_controller().await?;
        self.await_controller_ready().await?;
        info!("Controller restored to a known good state");
        Ok(KnownGoodState { cleared, reset })
    }
}
