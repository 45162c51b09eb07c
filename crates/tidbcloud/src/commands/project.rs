//! Project and specification listing

use serde_json::json;
use tidbcloud_core::api;
use tidbcloud_core::models::NodeOffering;
use tracing::debug;

use crate::cli::{ProjectCommands, SpecCommands};
use crate::commands::emit;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::OutputFormat;

pub async fn handle_project_command(
    cmd: &ProjectCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        ProjectCommands::List => {
            let conn = conn_mgr.resolve(profile_name)?;
            let client = conn_mgr.client(&conn).await?;
            let projects = api::list_projects(&client).await?;
            debug!("Found {} projects", projects.len());

            emit(
                &projects,
                || {
                    json!(
                        projects
                            .iter()
                            .map(|p| json!({
                                "id": p.id.to_string(),
                                "name": p.name,
                                "clusters": p.cluster_count,
                                "users": p.user_count,
                            }))
                            .collect::<Vec<_>>()
                    )
                },
                output_format,
            )
        }
    }
}

pub async fn handle_spec_command(
    cmd: &SpecCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        SpecCommands::List => {
            let conn = conn_mgr.resolve(profile_name)?;
            let client = conn_mgr.client(&conn).await?;
            let specs = api::list_specifications(&client).await?;

            emit(
                &specs,
                || {
                    json!(
                        specs
                            .items
                            .iter()
                            .map(|s| json!({
                                "type": s.cluster_type,
                                "provider": s.cloud_provider,
                                "region": s.region,
                                "tidb": node_sizes(&s.tidb),
                                "tikv": node_sizes(&s.tikv),
                                "tiflash": node_sizes(&s.tiflash),
                            }))
                            .collect::<Vec<_>>()
                    )
                },
                output_format,
            )
        }
    }
}

fn node_sizes(offerings: &[NodeOffering]) -> String {
    if offerings.is_empty() {
        return "-".to_string();
    }
    offerings
        .iter()
        .map(|o| o.node_size.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_sizes() {
        assert_eq!(node_sizes(&[]), "-");
        let offerings = vec![
            NodeOffering {
                node_size: "8C16G".to_string(),
                ..Default::default()
            },
            NodeOffering {
                node_size: "16C32G".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(node_sizes(&offerings), "8C16G, 16C32G");
    }
}
