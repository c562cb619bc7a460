//! Attempt budgets and delays for the workflow loops

use std::time::Duration;

/// Budgets and fixed delays used by every loop in this crate
///
/// The defaults are the values the controller firmware is known to need; a
/// profile may override them (see [`crate::config::RetrySettings`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Import submissions per apply call
    pub apply_attempts: u32,
    /// Sleep between failed submissions
    pub apply_delay: Duration,
    /// Readiness probes per wait
    pub ready_attempts: u32,
    /// Sleep between readiness probes
    pub ready_delay: Duration,
    /// Power state polling interval during a power cycle
    pub power_poll_interval: Duration,
    /// Intervals to wait for each power transition before giving up
    pub power_poll_attempts: u32,
    /// Task monitor polling interval
    pub task_poll_interval: Duration,
    /// Upper bound on a single task monitor wait
    pub task_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            apply_attempts: 10,
            apply_delay: Duration::from_secs(15),
            ready_attempts: 96,
            ready_delay: Duration::from_secs(10),
            power_poll_interval: Duration::from_secs(30),
            power_poll_attempts: 20,
            task_poll_interval: Duration::from_secs(1),
            task_timeout: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Same budgets with every delay scaled to `delay`; handy for tests
    /// against a live mock server
    pub fn with_uniform_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = delay;
        self.ready_delay = delay;
        self.power_poll_interval = delay;
        self.task_poll_interval = delay;
        self
    }
}
