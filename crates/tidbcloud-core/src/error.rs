//! Unified error handling for tidbcloud-core
//!
//! Every failure a workflow step can hit is one of these variants, so callers
//! can tell "the server rejected me" (`Api`) apart from "the server answered
//! but the body didn't parse" (`Decode`) and "I never reached the server"
//! (`Transport`).
//!
//! # Example
//!
//! ```rust
//! use tidbcloud_core::CoreError;
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_not_found() {
//!         println!("Resource not found");
//!     } else if err.is_timeout() {
//!         println!("Gave up waiting");
//!     }
//! }
//!
//! let err = CoreError::Api { status: 404, body: "not found".to_string() };
//! assert!(err.is_not_found());
//! assert_eq!(err.status(), Some(404));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Core error type for transport, decoding, and convergence failures
#[derive(Error, Debug)]
pub enum CoreError {
    /// The server answered with anything other than `200 OK`
    #[error("Failed with status {status} and resp {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape
    #[error("Failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The request payload could not be serialized
    #[error("Failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// The digest challenge could not be answered
    #[error("Digest authentication failed: {0}")]
    Auth(String),

    /// A convergence wait hit its time or attempt bound
    #[error("Timed out waiting for {scenario} after {elapsed:?} ({attempts} attempts)")]
    ConvergenceTimeout {
        scenario: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// A convergence wait was cancelled by the caller
    #[error("Cancelled while waiting for {scenario}")]
    ConvergenceCancelled { scenario: String },

    /// The convergence predicate kept failing to reach the remote
    #[error("Lookup for {scenario} failed {failures} times in a row: {last_error}")]
    LookupFailed {
        scenario: String,
        failures: u32,
        last_error: String,
    },

    /// A resource exists but is not in a state the step can act on
    #[error("Bad {resource} status: {status}")]
    InvalidState { resource: String, status: String },

    /// A required remote object (project, specification, ...) is missing
    #[error("No {0} found")]
    NotFound(String),

    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// HTTP status attached to an `Api` error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Api { status, .. } => Some(*status),
            CoreError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body attached to an `Api` or `Decode` error
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            CoreError::Api { body, .. } | CoreError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404 or missing object)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_)) || self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Auth(_)) || matches!(self.status(), Some(401 | 403))
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if this is a request or convergence timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Transport(e) => e.is_timeout(),
            CoreError::ConvergenceTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the server answered but the body could not be parsed
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, CoreError::Decode { .. })
    }

    /// Returns true if this error came out of a convergence wait
    #[must_use]
    pub fn is_convergence(&self) -> bool {
        matches!(
            self,
            CoreError::ConvergenceTimeout { .. }
                | CoreError::ConvergenceCancelled { .. }
                | CoreError::LookupFailed { .. }
        )
    }
}
