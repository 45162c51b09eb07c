//! Convergence polling for eventually-consistent resources
//!
//! Control-plane requests only *start* a state transition; the resource
//! reaches its target state later. [`Poller::wait_for`] re-evaluates a
//! caller-supplied predicate once per interval until it reports `true`.
//!
//! The first evaluation happens one interval after entry, never
//! immediately. Each unsuccessful evaluation is logged. With every bound
//! left at `None` the poller waits forever, exactly like a bare
//! fixed-interval loop; set `timeout`, `max_attempts`, or
//! `max_consecutive_failures` (or attach a cancellation channel) to get a
//! distinguished error instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use tidbcloud_core::poller::{PollConfig, Poller};
//! use std::time::Duration;
//!
//! let poller = Poller::new(PollConfig::default().with_timeout(Duration::from_secs(1800)));
//! poller
//!     .wait_for("cluster", || async {
//!         api::get_cluster(&client, project_id, cluster_id)
//!             .await
//!             .map(|cluster| cluster.is_available())
//!     })
//!     .await?;
//! ```

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

/// Default time between predicate evaluations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence and bounds for a convergence wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between evaluations (and before the first one)
    pub interval: Duration,
    /// Give up once the next evaluation would land past this
    pub timeout: Option<Duration>,
    /// Give up after this many evaluations
    pub max_attempts: Option<u32>,
    /// Surface predicate errors after this many in a row
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_attempts: None,
            max_consecutive_failures: None,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_max_consecutive_failures(mut self, failures: u32) -> Self {
        self.max_consecutive_failures = Some(failures);
        self
    }

    /// True when no bound is set and only cancellation can end a stall
    pub fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.max_attempts.is_none()
    }
}

/// Progress events emitted during a wait
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The wait has begun
    Started { scenario: String },
    /// The predicate reported "not yet"
    Waiting {
        scenario: String,
        attempt: u32,
        elapsed: Duration,
    },
    /// The predicate could not reach the remote
    LookupFailed {
        scenario: String,
        attempt: u32,
        error: String,
    },
    /// The predicate reported `true`
    Converged {
        scenario: String,
        attempts: u32,
        elapsed: Duration,
    },
    /// The wait ended without converging
    GaveUp { scenario: String, reason: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner; library callers usually pass none.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Successful outcome of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    pub scenario: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Fixed-interval convergence poller
#[derive(Default)]
pub struct Poller {
    config: PollConfig,
    cancel: Option<watch::Receiver<bool>>,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("config", &self.config)
            .field("cancellable", &self.cancel.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            cancel: None,
            on_progress: None,
        }
    }

    /// Abort any wait once `cancel` holds `true`
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Evaluate `predicate` once per interval until it returns `Ok(true)`.
    ///
    /// `Ok(false)` means "remote says not ready yet". `Err(_)` means "could
    /// not ask the remote"; it is treated as not-yet until
    /// `max_consecutive_failures` errors arrive back to back.
    pub async fn wait_for<F, Fut, E>(&self, scenario: &str, mut predicate: F) -> Result<Convergence>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<bool, E>>,
        E: Display,
    {
        let interval = self.config.interval;
        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancel = self.cancel.clone();

        let mut attempts: u32 = 0;
        let mut failures: u32 = 0;

        debug!(scenario, config = ?self.config, "waiting for convergence");
        self.emit(ProgressEvent::Started {
            scenario: scenario.to_string(),
        });

        // A deadline shorter than one interval leaves no room for any check
        if let Some(timeout) = self.config.timeout
            && interval > timeout
        {
            return Err(self.timed_out(scenario, attempts, start.elapsed()));
        }

        loop {
            tokio::select! {
                biased;
                _ = cancelled(cancel.as_mut()) => {
                    info!(scenario, attempts, "wait cancelled");
                    self.emit(ProgressEvent::GaveUp {
                        scenario: scenario.to_string(),
                        reason: "cancelled".to_string(),
                    });
                    return Err(CoreError::ConvergenceCancelled {
                        scenario: scenario.to_string(),
                    });
                }
                _ = ticker.tick() => {}
            }

            attempts += 1;
            let elapsed = start.elapsed();

            match predicate().await {
                Ok(true) => {
                    info!(scenario, attempts, ?elapsed, "{} is ready", scenario);
                    self.emit(ProgressEvent::Converged {
                        scenario: scenario.to_string(),
                        attempts,
                        elapsed,
                    });
                    return Ok(Convergence {
                        scenario: scenario.to_string(),
                        attempts,
                        elapsed,
                    });
                }
                Ok(false) => {
                    failures = 0;
                    self.emit(ProgressEvent::Waiting {
                        scenario: scenario.to_string(),
                        attempt: attempts,
                        elapsed,
                    });
                }
                Err(e) => {
                    failures += 1;
                    warn!(scenario, attempt = attempts, error = %e, "convergence lookup failed");
                    self.emit(ProgressEvent::LookupFailed {
                        scenario: scenario.to_string(),
                        attempt: attempts,
                        error: e.to_string(),
                    });

                    if let Some(max) = self.config.max_consecutive_failures
                        && failures >= max
                    {
                        self.emit(ProgressEvent::GaveUp {
                            scenario: scenario.to_string(),
                            reason: "lookup failed".to_string(),
                        });
                        return Err(CoreError::LookupFailed {
                            scenario: scenario.to_string(),
                            failures,
                            last_error: e.to_string(),
                        });
                    }
                }
            }

            info!("still waiting {} to get ready...", scenario);

            if self.out_of_budget(attempts, start.elapsed()) {
                return Err(self.timed_out(scenario, attempts, start.elapsed()));
            }
        }
    }

    fn timed_out(&self, scenario: &str, attempts: u32, elapsed: Duration) -> CoreError {
        info!(scenario, attempts, ?elapsed, "wait timed out");
        self.emit(ProgressEvent::GaveUp {
            scenario: scenario.to_string(),
            reason: "timed out".to_string(),
        });
        CoreError::ConvergenceTimeout {
            scenario: scenario.to_string(),
            attempts,
            elapsed,
        }
    }

    fn out_of_budget(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.config.max_attempts
            && attempts >= max
        {
            return true;
        }
        if let Some(timeout) = self.config.timeout
            && elapsed + self.config.interval > timeout
        {
            return true;
        }
        false
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

/// Resolves once the channel holds `true`; pends forever without a channel
/// or after its sender is dropped.
async fn cancelled(cancel: Option<&mut watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

/// Wait with the default one-second cadence and no bounds.
///
/// Blocks until `predicate` returns `true`; there is no way out otherwise.
pub async fn await_condition<F, Fut>(scenario: &str, mut predicate: F) -> Convergence
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let poller = Poller::default();
    let result = poller
        .wait_for(scenario, || {
            let fut = predicate();
            async move { Ok::<bool, Infallible>(fut.await) }
        })
        .await;

    match result {
        Ok(convergence) => convergence,
        Err(_) => unreachable!("an unbounded, uncancellable wait only ends by converging"),
    }
}
