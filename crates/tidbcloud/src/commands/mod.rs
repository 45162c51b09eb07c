//! Command implementations

pub mod backup;
pub mod cluster;
pub mod profile;
pub mod project;
pub mod wait;

use serde::Serialize;
use serde_json::{Value, json};
use tidbcloud_core::models::{Backup, Cluster, Component};

use crate::error::Result as CliResult;
use crate::output::{self, OutputFormat};

/// Print `full` as JSON/YAML, or the flattened `summary` as a table
pub(crate) fn emit<T: Serialize>(
    full: &T,
    summary: impl FnOnce() -> Value,
    format: OutputFormat,
) -> CliResult<()> {
    if format.is_table() {
        output::print_output(summary(), format)
    } else {
        output::print_output(full, format)
    }
}

pub(crate) fn cluster_summary(cluster: &Cluster) -> Value {
    let components = &cluster.config.components;
    json!({
        "id": cluster.id.to_string(),
        "name": cluster.name,
        "status": cluster.status(),
        "type": cluster.cluster_type,
        "provider": cluster.cloud_provider,
        "region": cluster.region,
        "version": cluster.status.tidb_version,
        "tidb": component_summary(components.tidb.as_ref()),
        "tikv": component_summary(components.tikv.as_ref()),
        "tiflash": component_summary(components.tiflash.as_ref()),
        "connection": cluster.connection_strings.standard,
    })
}

pub(crate) fn backup_summary(backup: &Backup) -> Value {
    json!({
        "id": backup.id.to_string(),
        "name": backup.name,
        "type": backup.backup_type,
        "status": backup.status,
        "size": backup.size,
        "created": backup.create_timestamp,
    })
}

fn component_summary(component: Option<&Component>) -> String {
    match component {
        Some(c) if c.is_provisioned() && c.storage_size_gib > 0 => format!(
            "{} x {} ({} GiB)",
            c.node_quantity, c.node_size, c.storage_size_gib
        ),
        Some(c) if c.is_provisioned() => format!("{} x {}", c.node_quantity, c.node_size),
        _ => "-".to_string(),
    }
}
