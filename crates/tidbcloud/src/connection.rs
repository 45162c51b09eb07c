//! Connection management: profile selection, env overrides, shared client

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tidbcloud_core::config::ProcessEnv;
use tidbcloud_core::{ApiClient, Config, Connection, TransportInitializer};
use tracing::{debug, info, trace};

use crate::cli::TargetArgs;
use crate::error::Result as CliResult;

/// Resolves credentials and hands out one authenticated client per run
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    transport: TransportInitializer,
}

impl ConnectionManager {
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            transport: TransportInitializer::new(),
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Path shown to the user for the active config file
    pub fn display_path(&self) -> Option<String> {
        self.config_path
            .clone()
            .or_else(|| Config::config_path().ok())
            .map(|p| p.display().to_string())
    }

    /// Merge the selected profile with environment overrides.
    ///
    /// Fails before any network call when credentials are missing.
    pub fn resolve(&self, profile_name: Option<&str>) -> CliResult<Connection> {
        trace!("Profile name: {:?}", profile_name);
        let selected = self.config.resolve_profile(profile_name)?;
        match selected {
            Some((name, _)) => info!("Using profile: {}", name),
            None => debug!("No profile selected, using environment only"),
        }
        Ok(Connection::resolve(selected, &ProcessEnv)?)
    }

    /// Resolve the connection and apply `--project-id` / `--cluster-id`
    pub fn resolve_target(
        &self,
        profile_name: Option<&str>,
        target: &TargetArgs,
    ) -> CliResult<Connection> {
        let mut conn = self.resolve(profile_name)?;
        if target.project_id.is_some() {
            conn.project_id = target.project_id;
        }
        if target.cluster_id.is_some() {
            conn.cluster_id = target.cluster_id;
        }
        Ok(conn)
    }

    /// The shared client, built on first use
    pub async fn client(&self, conn: &Connection) -> CliResult<Arc<ApiClient>> {
        debug!(api_url = %conn.api_url, "Creating TiDB Cloud client");
        Ok(self
            .transport
            .initialize_with(|| conn.client_builder().build())
            .await?)
    }
}
