//! Cluster command implementations

use serde_json::json;
use tidbcloud_core::workflows::{self, ClusterOutcome, WorkflowOptions};
use tidbcloud_core::{Connection, api};
use tracing::info;

use crate::cli::{ClusterCommands, CreateArgs};
use crate::commands::wait::Waiter;
use crate::commands::{cluster_summary, emit};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Copy)]
enum ClusterKind {
    Developer,
    Dedicated,
}

pub async fn handle_cluster_command(
    cmd: &ClusterCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        ClusterCommands::Get { target } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            let cluster = api::get_cluster(&client, project_id, cluster_id).await?;
            emit(&cluster, || cluster_summary(&cluster), output_format)
        }
        ClusterCommands::Delete { target } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            api::delete_cluster(&client, project_id, cluster_id).await?;
            info!(cluster_id, "cluster deleted");
            if output_format.is_table() {
                println!("Cluster {} deletion requested", cluster_id);
                Ok(())
            } else {
                output::print_output(
                    json!({"project_id": project_id.to_string(), "cluster_id": cluster_id.to_string(), "deleted": true}),
                    output_format,
                )
            }
        }
        ClusterCommands::CreateDeveloper { create } => {
            create_cluster(conn_mgr, profile_name, create, ClusterKind::Developer, output_format).await
        }
        ClusterCommands::CreateDedicated { create } => {
            create_cluster(conn_mgr, profile_name, create, ClusterKind::Dedicated, output_format).await
        }
        ClusterCommands::ScaleOutTiflash { target, wait } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            let waiter = Waiter::for_args(&conn.settings, wait, output_format.is_table());
            let options = WorkflowOptions {
                wait: wait.wait,
                ..Default::default()
            };
            let outcome =
                workflows::scale_out_tiflash(&client, waiter.poller(), &options, project_id, cluster_id)
                    .await?;
            waiter.finish("TiFlash scale-out submitted");
            drop(waiter);

            print_outcome(&outcome, output_format)
        }
    }
}

async fn create_cluster(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    create: &CreateArgs,
    kind: ClusterKind,
    output_format: OutputFormat,
) -> CliResult<()> {
    let conn = conn_mgr.resolve(profile_name)?;
    let client = conn_mgr.client(&conn).await?;

    let options = workflow_options(&conn, create);
    let waiter = Waiter::for_args(&conn.settings, &create.wait, output_format.is_table());

    let outcome = match kind {
        ClusterKind::Developer => {
            workflows::create_developer_cluster(&client, waiter.poller(), &options).await?
        }
        ClusterKind::Dedicated => {
            workflows::create_dedicated_cluster(&client, waiter.poller(), &options).await?
        }
    };
    waiter.finish("Cluster created");
    drop(waiter);

    print_outcome(&outcome, output_format)
}

fn workflow_options(conn: &Connection, create: &CreateArgs) -> WorkflowOptions {
    WorkflowOptions {
        cluster_name: create.name.clone(),
        root_password: create.root_password.clone(),
        wait: create.wait.wait,
        auto_cleanup: create.auto_cleanup || conn.settings.auto_cleanup,
        ..Default::default()
    }
}

fn print_outcome(outcome: &ClusterOutcome, output_format: OutputFormat) -> CliResult<()> {
    if !output_format.is_table() {
        return output::print_output(outcome, output_format);
    }

    let mut summary = cluster_summary(&outcome.cluster);
    summary["project_id"] = json!(outcome.project_id.to_string());
    summary["ready"] = json!(outcome.ready);
    if outcome.cleaned_up {
        summary["cleaned_up"] = json!(true);
    }
    output::print_output(summary, output_format)?;

    if !outcome.ready && !outcome.cleaned_up {
        println!(
            "Cluster {} is {}; re-run with --wait or check with: tidbcloud cluster get --project-id {} --cluster-id {}",
            outcome.cluster_id,
            outcome.cluster.status(),
            outcome.project_id,
            outcome.cluster_id
        );
    }
    Ok(())
}
