//! Backup command implementations

use serde_json::json;
use tidbcloud_core::models::CreateBackupRequest;
use tidbcloud_core::workflows::{self, BackupOutcome, WorkflowOptions};
use tidbcloud_core::api;
use tracing::info;

use crate::cli::BackupCommands;
use crate::commands::wait::Waiter;
use crate::commands::{backup_summary, emit};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{self, OutputFormat};

pub async fn handle_backup_command(
    cmd: &BackupCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        BackupCommands::Create {
            target,
            name,
            description,
            wait,
        } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            let request = backup_request(name.as_deref(), description.as_deref());
            let backup_id = api::create_backup(&client, project_id, cluster_id, &request)
                .await?
                .id;
            info!(backup_id, "backup requested");

            let backup = if wait.wait {
                let waiter = Waiter::for_args(&conn.settings, wait, output_format.is_table());
                let backup = workflows::wait_for_backup_success(
                    &client,
                    waiter.poller(),
                    project_id,
                    cluster_id,
                    backup_id,
                )
                .await?;
                waiter.finish("Backup finished");
                backup
            } else {
                api::get_backup(&client, project_id, cluster_id, backup_id).await?
            };

            emit(&backup, || backup_summary(&backup), output_format)
        }
        BackupCommands::Get { target, backup_id } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            let backup = api::get_backup(&client, project_id, cluster_id, *backup_id).await?;
            emit(&backup, || backup_summary(&backup), output_format)
        }
        BackupCommands::Delete { target, backup_id } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            api::delete_backup(&client, project_id, cluster_id, *backup_id).await?;
            if output_format.is_table() {
                println!("Backup {} deleted", backup_id);
                Ok(())
            } else {
                output::print_output(
                    json!({"backup_id": backup_id.to_string(), "deleted": true}),
                    output_format,
                )
            }
        }
        BackupCommands::RestoreDemo {
            target,
            restore_name,
            root_password,
            auto_cleanup,
            wait,
        } => {
            let conn = conn_mgr.resolve_target(profile_name, target)?;
            let (project_id, cluster_id) = (conn.require_project_id()?, conn.require_cluster_id()?);
            let client = conn_mgr.client(&conn).await?;

            let options = WorkflowOptions {
                restore_name: restore_name.clone(),
                root_password: root_password.clone().unwrap_or_default(),
                wait: wait.wait,
                auto_cleanup: *auto_cleanup || conn.settings.auto_cleanup,
                ..Default::default()
            };
            let waiter = Waiter::for_args(&conn.settings, wait, output_format.is_table());
            let outcome = workflows::backup_and_restore(
                &client,
                waiter.poller(),
                &options,
                project_id,
                cluster_id,
            )
            .await?;
            waiter.finish("Backup and restore finished");
            drop(waiter);

            print_outcome(&outcome, output_format)
        }
    }
}

fn backup_request(name: Option<&str>, description: Option<&str>) -> CreateBackupRequest {
    let mut request = workflows::backup_request(chrono::Local::now().date_naive());
    if let Some(name) = name {
        request.name = name.to_string();
    }
    if let Some(description) = description {
        request.description = description.to_string();
    }
    request
}

fn print_outcome(outcome: &BackupOutcome, output_format: OutputFormat) -> CliResult<()> {
    if !output_format.is_table() {
        return output::print_output(outcome, output_format);
    }

    output::print_output(
        json!({
            "project_id": outcome.project_id.to_string(),
            "cluster_id": outcome.cluster_id.to_string(),
            "backup_id": outcome.backup_id.to_string(),
            "backup_status": outcome.backup.as_ref().map(|b| b.status.as_str()),
            "restored_cluster_id": outcome.restored_cluster_id.map(|id| id.to_string()),
            "restored_status": outcome.restored_cluster.as_ref().map(|c| c.status()),
            "cleaned_up": outcome.cleaned_up,
        }),
        output_format,
    )?;

    if outcome.restored_cluster_id.is_none() {
        println!("Backup requested; re-run with --wait to restore once it succeeds");
    }
    Ok(())
}
