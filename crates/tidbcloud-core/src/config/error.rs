//! Configuration failures

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    /// A required value is absent from both the profile and the environment
    #[error("Missing {what}. {suggestion}")]
    Missing { what: String, suggestion: String },

    #[error("Invalid {name} '{value}': expected a numeric id")]
    InvalidId { name: String, value: String },

    #[error("No home directory to place the config file in")]
    NoConfigDir,
}

impl ConfigError {
    pub(crate) fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| ConfigError::Io {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
