//! Configuration import with retry and power-cycle recovery
//!
//! Submits a boot device bundle through `ImportSystemConfiguration` until the
//! controller accepts it or the attempt budget runs out. A "configuration job
//! pending" report triggers one power cycle of the managed system followed by
//! an immediate resubmission; every other retryable failure sleeps first.

use tracing::{error, info, warn};

use crate::bundle::{ConfigBundle, MediaKind, VirtualMediaType};
use crate::classify::ErrorClass;
use crate::error::{CoreError, Result};
use crate::policy::RetryPolicy;
use crate::power::{ManagedSystem, power_cycle};
use crate::transport::{RestResponse, Transport};

const OPERATION: &str = "import system configuration";

/// Successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Response to the accepted submission
    pub response: RestResponse,
    /// Failed submissions before the accepted one
    pub retries: u32,
}

impl ApplyOutcome {
    /// Job created for the import, when the controller reported one
    pub fn job_id(&self) -> Option<&str> {
        self.response.job_id()
    }
}

/// Drives one import action target
pub struct ConfigApplyController<'a, T: Transport + ?Sized> {
    transport: &'a T,
    import_uri: &'a str,
    component_id: &'a str,
    policy: &'a RetryPolicy,
}

impl<'a, T: Transport + ?Sized> ConfigApplyController<'a, T> {
    pub fn new(
        transport: &'a T,
        import_uri: &'a str,
        component_id: &'a str,
        policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            transport,
            import_uri,
            component_id,
            policy,
        }
    }

    /// Make `device` the first boot device.
    ///
    /// `persistent` keeps the override across boots; otherwise it applies to
    /// the next boot only. Devices without a bundle fail with
    /// [`CoreError::InvalidParameter`] before anything is sent.
    pub async fn apply<S: ManagedSystem + ?Sized>(
        &self,
        device: VirtualMediaType,
        persistent: bool,
        system: &S,
    ) -> Result<ApplyOutcome> {
        let media = MediaKind::try_from(device)?;
        let budget = self.policy.apply_attempts.max(1);
        let mut power_cycled = false;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let payload =
                ConfigBundle::boot_device(self.component_id, media, persistent).action_payload();

            let err = match self.transport.post(self.import_uri, &payload).await {
                Ok(response) => {
                    let retries = attempt - 1;
                    info!(%device, persistent, retries, "Set boot device via configuration import");
                    return Ok(ApplyOutcome { response, retries });
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                error!(%device, error = %err, "Configuration import failed");
                return Err(CoreError::remote(OPERATION, err));
            }

            let attempts_left = budget - attempt;
            warn!(%device, attempts_left, error = %err, "Configuration import failed");

            let report = err.report();
            for entry in &report.entries {
                warn!(message_id = %entry.message_id, "iDRAC error: {}", entry.message);
            }

            if attempts_left == 0 {
                error!(attempts = budget, "Too many retries, giving up");
                return Err(CoreError::remote(OPERATION, err));
            }

            match report.class() {
                ErrorClass::ConfigPending if !power_cycled => {
                    warn!(
                        "Configuration job pending, power cycling the system. \
                         This may consume a previously set one-time boot override"
                    );
                    power_cycle(system, self.policy).await?;
                    power_cycled = true;
                }
                _ => tokio::time::sleep(self.policy.apply_delay).await,
            }
        }
    }
}
