//! Retry budget overrides stored in profiles
//!
//! Every field is optional in TOML; anything left out falls back to the
//! [`RetryPolicy`] default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::RetryPolicy;

/// `[profiles.<name>.retry]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Import submissions per apply call
    #[serde(default = "default_apply_attempts")]
    pub apply_attempts: u32,

    /// Seconds between failed submissions
    #[serde(default = "default_apply_delay")]
    pub apply_delay_secs: u64,

    /// Readiness probes after a controller reset
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    /// Seconds between readiness probes
    #[serde(default = "default_ready_delay")]
    pub ready_delay_secs: u64,

    /// Seconds between power state polls
    #[serde(default = "default_power_poll_interval")]
    pub power_poll_interval_secs: u64,

    /// Polls per power transition
    #[serde(default = "default_power_poll_attempts")]
    pub power_poll_attempts: u32,

    /// Seconds between task monitor polls
    #[serde(default = "default_task_poll_interval")]
    pub task_poll_interval_secs: u64,

    /// Seconds to wait on a task monitor
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            apply_attempts: default_apply_attempts(),
            apply_delay_secs: default_apply_delay(),
            ready_attempts: default_ready_attempts(),
            ready_delay_secs: default_ready_delay(),
            power_poll_interval_secs: default_power_poll_interval(),
            power_poll_attempts: default_power_poll_attempts(),
            task_poll_interval_secs: default_task_poll_interval(),
            task_timeout_secs: default_task_timeout(),
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            apply_attempts: self.apply_attempts,
            apply_delay: Duration::from_secs(self.apply_delay_secs),
            ready_attempts: self.ready_attempts,
            ready_delay: Duration::from_secs(self.ready_delay_secs),
            power_poll_interval: Duration::from_secs(self.power_poll_interval_secs),
            power_poll_attempts: self.power_poll_attempts,
            task_poll_interval: Duration::from_secs(self.task_poll_interval_secs),
            task_timeout: Duration::from_secs(self.task_timeout_secs),
        }
    }
}

// Default value functions for serde
fn default_apply_attempts() -> u32 {
    RetryPolicy::default().apply_attempts
}

fn default_apply_delay() -> u64 {
    RetryPolicy::default().apply_delay.as_secs()
}

fn default_ready_attempts() -> u32 {
    RetryPolicy::default().ready_attempts
}

fn default_ready_delay() -> u64 {
    RetryPolicy::default().ready_delay.as_secs()
}

fn default_power_poll_interval() -> u64 {
    RetryPolicy::default().power_poll_interval.as_secs()
}

fn default_power_poll_attempts() -> u32 {
    RetryPolicy::default().power_poll_attempts
}

fn default_task_poll_interval() -> u64 {
    RetryPolicy::default().task_poll_interval.as_secs()
}

fn default_task_timeout() -> u64 {
    RetryPolicy::default().task_timeout.as_secs()
}
