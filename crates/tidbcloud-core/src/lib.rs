//! # tidbcloud-core
//!
//! Library layer behind the `tidbcloud` CLI: an authenticated transport for
//! the TiDB Cloud `v1beta` API, a bounded convergence poller, and the
//! multi-step cluster/backup workflows built on top of them.
//!
//! ## Layers
//!
//! - [`client`] - digest-authenticated [`ApiClient`] and the one-time
//!   [`TransportInitializer`]
//! - [`api`] - one helper per endpoint
//! - [`poller`] - [`Poller`] waits until a predicate holds
//! - [`workflows`] - create, scale, and backup/restore scripts
//! - [`config`] - profiles, settings, and environment resolution
//!
//! ## Example
//!
//! ```rust,ignore
//! use tidbcloud_core::{api, ApiClient, Credentials};
//!
//! let client = ApiClient::builder()
//!     .credentials(Credentials::new("public", "private")?)
//!     .build()?;
//! let projects = api::list_projects(&client).await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod workflows;

pub use client::{ApiClient, ApiClientBuilder, Credentials, TransportInitializer};
pub use config::{Config, ConfigError, Connection, Profile, Settings};
pub use error::{CoreError, Result};
pub use poller::{Convergence, PollConfig, Poller, ProgressCallback, ProgressEvent};
pub use workflows::{BackupOutcome, ClusterOutcome, WorkflowOptions};
