//! Configuration file handling
//!
//! Configuration is stored in TOML format with support for multiple named
//! profiles, each carrying an API key pair, optional default ids, and
//! [`Settings`].

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use super::settings::Settings;
use crate::client::DEFAULT_API_URL;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub public_key: String,
    pub private_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Project used by cluster and backup commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    /// Cluster used by scale and backup commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<u64>,
    #[serde(default)]
    pub settings: Settings,
}

impl Profile {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            api_url: default_api_url(),
            project_id: None,
            cluster_id: None,
            settings: Settings::default(),
        }
    }
}

impl Config {
    /// Pick the profile to use: the explicit name, then `default_profile`,
    /// then the only profile if there is exactly one.
    ///
    /// Returns `Ok(None)` when nothing is configured; the environment may
    /// still supply credentials.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<Option<(&str, &Profile)>> {
        if let Some(name) = explicit_profile {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, v)| Some((k.as_str(), v)))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
        }

        if let Some(name) = self.default_profile.as_deref() {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, v)| Some((k.as_str(), v)))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
        }

        if self.profiles.len() == 1 {
            return Ok(self.profiles.iter().next().map(|(k, v)| (k.as_str(), v)));
        }

        Ok(None)
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file is empty config
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(ConfigError::io("read", config_path))?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::io("create", parent))?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(ConfigError::io("write", config_path))?;

        Ok(())
    }

    /// Insert or replace a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile, clearing the default if it pointed at it
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// Profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Platform config file path (`~/.config/tidbcloud/config.toml` on Linux)
    pub fn config_path() -> Result<PathBuf> {
        // Prefer the Linux-style path on macOS when the user already has one
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("tidbcloud")
                    .join("config.toml");

                if linux_style_path.exists() {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "tidbcloud", "tidbcloud").ok_or(ConfigError::NoConfigDir)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}`; unknown variables are left as-is
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
