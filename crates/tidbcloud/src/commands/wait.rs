//! Spinner and Ctrl+C wiring for convergence waits
//!
//! Wraps the core [`Poller`] with an `indicatif` spinner fed by its progress
//! events and a `tokio::signal` task that cancels the wait on Ctrl+C.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tidbcloud_core::{PollConfig, Poller, ProgressEvent, Settings};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cli::WaitArgs;

/// Poll bounds from profile settings with command-line overrides
pub fn poll_config(settings: &Settings, args: &WaitArgs) -> PollConfig {
    let mut config = settings.poll_config();
    if let Some(interval) = args.wait_interval {
        config.interval = Duration::from_secs(interval.max(1));
    }
    match args.wait_timeout {
        Some(0) => config.timeout = None,
        Some(secs) => config.timeout = Some(Duration::from_secs(secs)),
        None => {}
    }
    config
}

/// A poller with a live spinner; dropping it clears the spinner and stops
/// listening for Ctrl+C
pub struct Waiter {
    poller: Poller,
    spinner: ProgressBar,
    signal_task: Option<JoinHandle<()>>,
}

impl Waiter {
    /// Waiter for a command; without `--wait` no signal handler is installed
    pub fn for_args(settings: &Settings, args: &WaitArgs, show_progress: bool) -> Self {
        if args.wait {
            Self::new(poll_config(settings, args), show_progress)
        } else {
            Self {
                poller: Poller::new(poll_config(settings, args)),
                spinner: ProgressBar::hidden(),
                signal_task: None,
            }
        }
    }

    pub fn new(config: PollConfig, show_progress: bool) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Ctrl+C received, cancelling wait");
                let _ = cancel_tx.send(true);
            }
        });

        let spinner = if show_progress {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
            {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        } else {
            ProgressBar::hidden()
        };

        let pb = spinner.clone();
        let poller = Poller::new(config)
            .cancel_on(cancel_rx)
            .on_progress(Box::new(move |event| pb.set_message(describe(&event))));

        Self {
            poller,
            spinner,
            signal_task: Some(signal_task),
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn finish(&self, message: &str) {
        if self.spinner.is_hidden() {
            return;
        }
        self.spinner.finish_with_message(message.to_string());
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Some(task) = &self.signal_task {
            task.abort();
        }
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { scenario } => format!("Waiting for {}", scenario),
        ProgressEvent::Waiting {
            scenario, attempt, ..
        } => format!("Still waiting for {} (check {})", scenario, attempt),
        ProgressEvent::LookupFailed {
            scenario, error, ..
        } => format!("Could not check {}: {}", scenario, error),
        ProgressEvent::Converged { scenario, .. } => format!("\u{2713} {} is ready", scenario),
        ProgressEvent::GaveUp { scenario, reason } => {
            format!("\u{2717} Stopped waiting for {}: {}", scenario, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let args = WaitArgs {
            wait: true,
            wait_timeout: Some(120),
            wait_interval: Some(10),
        };
        let config = poll_config(&Settings::default(), &args);
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.max_consecutive_failures, Some(5));
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let settings = Settings {
            poll_timeout_secs: 600,
            ..Default::default()
        };
        let args = WaitArgs {
            wait: true,
            wait_timeout: Some(0),
            wait_interval: None,
        };
        assert_eq!(poll_config(&settings, &args).timeout, None);
        assert_eq!(
            poll_config(&settings, &WaitArgs::default()).timeout,
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_describe_events() {
        let msg = describe(&ProgressEvent::Waiting {
            scenario: "cluster".to_string(),
            attempt: 3,
            elapsed: Duration::from_secs(3),
        });
        assert_eq!(msg, "Still waiting for cluster (check 3)");
    }
}
