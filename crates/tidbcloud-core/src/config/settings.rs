//! Per-profile tuning for requests and convergence waits

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::poller::{DEFAULT_POLL_INTERVAL, PollConfig};

/// Request and polling settings stored in a profile
///
/// A zero `poll_timeout_secs` or `max_consecutive_failures` means "no bound".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Seconds between convergence checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up waiting after this many seconds
    #[serde(default)]
    pub poll_timeout_secs: u64,

    /// Stop waiting after this many failed status lookups in a row
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Delete resources created by workflows once they finish
    #[serde(default)]
    pub auto_cleanup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: 0,
            max_consecutive_failures: default_max_consecutive_failures(),
            auto_cleanup: false,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Poller configuration for these settings
    pub fn poll_config(&self) -> PollConfig {
        let mut config =
            PollConfig::default().with_interval(Duration::from_secs(self.poll_interval_secs.max(1)));
        if self.poll_timeout_secs > 0 {
            config = config.with_timeout(Duration::from_secs(self.poll_timeout_secs));
        }
        if self.max_consecutive_failures > 0 {
            config = config.with_max_consecutive_failures(self.max_consecutive_failures);
        }
        config
    }
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_consecutive_failures() -> u32 {
    5
}
