//! Authenticated HTTP transport for the TiDB Cloud API
//!
//! [`ApiClient`] is the single chokepoint every request goes through: it
//! encodes the payload, performs the digest handshake, classifies the
//! status, and decodes the body. [`TransportInitializer`] guards one-time
//! construction when several call sites share a client.

mod digest;
mod init;
mod transport;

pub use init::TransportInitializer;
pub use transport::{ApiClient, ApiClientBuilder, DEFAULT_REQUEST_TIMEOUT, RawResponse};

pub use reqwest::Method;

use crate::error::{CoreError, Result};

/// Default API host
pub const DEFAULT_API_URL: &str = "https://api.tidbcloud.com";

/// User agent string for tidbcloud HTTP requests
pub const USER_AGENT: &str = concat!("tidbcloud/", env!("CARGO_PKG_VERSION"));

/// Public/private API key pair used for digest authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    private_key: String,
}

impl Credentials {
    /// Build a credential pair; both halves must be non-empty
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Result<Self> {
        let public_key = public_key.into();
        let private_key = private_key.into();

        if public_key.trim().is_empty() {
            return Err(CoreError::Validation("public key must not be empty".to_string()));
        }
        if private_key.trim().is_empty() {
            return Err(CoreError::Validation("private key must not be empty".to_string()));
        }

        Ok(Self {
            public_key,
            private_key,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_reject_empty_halves() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("public", "").is_err());
        assert!(Credentials::new("  ", "secret").is_err());
        assert!(Credentials::new("public", "secret").is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_private_key() {
        let creds = Credentials::new("public", "super-secret").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("public"));
        assert!(!debug.contains("super-secret"));
    }
}
