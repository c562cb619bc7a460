//! # idracctl-core
//!
//! Resilient configuration workflows for Dell iDRAC controllers over Redfish.
//!
//! iDRAC takes some configuration changes, such as a virtual media boot
//! override, only as an imported Server Configuration Profile processed in the
//! background. Getting one applied reliably means retrying around busy job
//! queues, occasionally power cycling the server to flush a pending job, and
//! waiting for the Lifecycle Controller after a reset. This crate owns those
//! loops.
//!
//! ## Layout
//!
//! - [`transport`]: the two-verb [`Transport`] seam and its reqwest
//!   implementation, including task monitor following ([`task`])
//! - [`bundle`] and [`classify`]: what gets submitted and how failures are read
//! - [`apply`]: the import loop with power-cycle recovery ([`power`])
//! - [`readiness`] and [`jobs`]: controller health and job queue plumbing
//! - [`manager`]: the [`DellManager`] facade over all of the above
//! - [`config`]: profiles, credentials and retry overrides
//!
//! All loops take their budgets from [`RetryPolicy`].

pub mod apply;
pub mod bundle;
pub mod classify;
pub mod config;
pub mod error;
pub mod jobs;
pub mod manager;
pub mod policy;
pub mod power;
pub mod readiness;
pub mod resource;
pub mod task;
pub mod transport;

pub use apply::{ApplyOutcome, ConfigApplyController};
pub use bundle::{BootOnce, ConfigBundle, MediaKind, VirtualMediaType};
pub use classify::{ControllerErrorReport, ErrorClass, ErrorEntry, classify};
pub use error::{CoreError, Result, TransportError};
pub use jobs::{CLEAR_ALL_JOBS, JobQueue, JobRecord, JobSelection, JobState};
pub use manager::{DellManager, KnownGoodState};
pub use policy::RetryPolicy;
pub use power::{ManagedSystem, PowerState, RedfishSystem, ResetType, power_cycle};
pub use readiness::{ProbeOutcome, ReadinessPoller, ReadinessResult};
pub use resource::ManagerEndpoints;
pub use task::{TaskCallback, TaskEvent, TaskMonitor};
pub use transport::{
    HttpTransport, HttpTransportConfig, RestResponse, Transport, TransportResult,
};
