//! Configuration and profile management for the TiDB Cloud CLI
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings come from three layers, later ones winning:
//!
//! - a TOML config file with named profiles
//! - environment variables (`TIDBCLOUD_PUBLIC_KEY`, `DEDICATED_PROJECT_ID`, ...)
//! - command-line flags (applied by the binary)
//!
//! `${VAR}` references inside the config file are expanded on load.

pub mod config;
pub mod env;
pub mod error;
pub mod settings;

pub use config::{Config, Profile};
pub use env::{Connection, EnvLookup, ProcessEnv};
pub use error::{ConfigError, Result};
pub use settings::Settings;
