//! Multi-step lifecycle workflows
//!
//! Each workflow is a strictly sequential script over [`crate::api`]: every
//! step's output (a project id, a new cluster id) feeds the next one. Waits
//! go through the caller's [`Poller`], so its bounds and cancellation apply.
//! Nothing is retried; any error aborts the workflow and is returned as-is.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::api;
use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::models::{
    Backup, CLUSTER_TYPE_DEVELOPER, Cluster, ClusterConfig, Component, Components,
    CreateBackupRequest, CreateClusterRequest, IpAccess, RestoreRequest, Specification,
    UpdateClusterRequest,
};
use crate::poller::Poller;

/// Default SQL port for new clusters
pub const DEFAULT_PORT: u16 = 4000;

/// Knobs shared by all workflows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Name for newly created clusters
    pub cluster_name: String,
    /// Name for clusters restored from a backup
    pub restore_name: String,
    /// Root password for new and restored clusters
    pub root_password: String,
    /// Wait for each created resource to converge before moving on
    pub wait: bool,
    /// Delete what the workflow created once it is done
    pub auto_cleanup: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            cluster_name: "tidbcloud-sample-1".to_string(),
            restore_name: "tidbcloud-sample-restore".to_string(),
            root_password: String::new(),
            wait: false,
            auto_cleanup: false,
        }
    }
}

impl WorkflowOptions {
    fn require_root_password(&self) -> Result<&str> {
        if self.root_password.is_empty() {
            return Err(CoreError::Validation(
                "a root password is required to create a cluster".to_string(),
            ));
        }
        Ok(&self.root_password)
    }
}

/// Result of a create or scale workflow
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutcome {
    pub project_id: u64,
    pub cluster_id: u64,
    /// Latest observed cluster detail
    pub cluster: Cluster,
    /// True only once the cluster reports `AVAILABLE`
    pub ready: bool,
    pub cleaned_up: bool,
}

/// Result of the backup/restore workflow
#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    pub project_id: u64,
    pub cluster_id: u64,
    pub backup_id: u64,
    pub backup: Option<Backup>,
    pub restored_cluster_id: Option<u64>,
    /// Restored cluster as last seen once it became `AVAILABLE`
    pub restored_cluster: Option<Cluster>,
    pub cleaned_up: bool,
}

// =============================================================================
// Waiting helpers
// =============================================================================

/// Poll until the cluster reports `AVAILABLE`, then return its detail
pub async fn wait_for_cluster_available(
    client: &ApiClient,
    poller: &Poller,
    project_id: u64,
    cluster_id: u64,
) -> Result<Cluster> {
    poller
        .wait_for("cluster", || async move {
            api::get_cluster(client, project_id, cluster_id)
                .await
                .map(|cluster| cluster.is_available())
        })
        .await?;
    api::get_cluster(client, project_id, cluster_id).await
}

/// Poll until the backup reports `SUCCESS`, then return its detail
pub async fn wait_for_backup_success(
    client: &ApiClient,
    poller: &Poller,
    project_id: u64,
    cluster_id: u64,
    backup_id: u64,
) -> Result<Backup> {
    poller
        .wait_for("backup", || async move {
            api::get_backup(client, project_id, cluster_id, backup_id)
                .await
                .map(|backup| backup.is_success())
        })
        .await?;
    api::get_backup(client, project_id, cluster_id, backup_id).await
}

// =============================================================================
// Create workflows
// =============================================================================

/// Create a developer-tier cluster in the first project
///
/// This workflow:
/// 1. Lists projects and picks the first one
/// 2. Creates a `DEVELOPER` cluster in AWS `us-east-1`
/// 3. Fetches the new cluster (optionally waiting for `AVAILABLE`)
/// 4. Deletes it again when `auto_cleanup` is set
pub async fn create_developer_cluster(
    client: &ApiClient,
    poller: &Poller,
    options: &WorkflowOptions,
) -> Result<ClusterOutcome> {
    let root_password = options.require_root_password()?;

    info!("Step 1: get all projects");
    let project_id = first_project_id(client).await?;

    info!(project_id, "Step 2: create developer cluster");
    let request = CreateClusterRequest {
        name: options.cluster_name.clone(),
        cluster_type: CLUSTER_TYPE_DEVELOPER.to_string(),
        cloud_provider: "AWS".to_string(),
        region: "us-east-1".to_string(),
        config: ClusterConfig {
            root_password: root_password.to_string(),
            ip_access_list: vec![IpAccess::allow_all()],
            ..Default::default()
        },
    };
    let created = api::create_cluster(client, project_id, &request).await?;

    finish_created_cluster(client, poller, options, project_id, created.id).await
}

/// Create a dedicated cluster sized from the smallest offering
///
/// This workflow:
/// 1. Picks the first `DEDICATED` specification
/// 2. Lists projects and picks the first one
/// 3. Creates a cluster with the minimum TiDB/TiKV topology
/// 4. Fetches the new cluster (optionally waiting for `AVAILABLE`)
/// 5. Deletes it again when `auto_cleanup` is set
pub async fn create_dedicated_cluster(
    client: &ApiClient,
    poller: &Poller,
    options: &WorkflowOptions,
) -> Result<ClusterOutcome> {
    let root_password = options.require_root_password()?;

    info!("Step 1: get specifications and projects");
    let specs = api::list_specifications(client).await?;
    let spec = api::find_dedicated_specification(&specs)?;
    let project_id = first_project_id(client).await?;

    let request = dedicated_cluster_request(spec, &options.cluster_name, root_password)?;

    info!(project_id, "Step 2: create dedicated cluster");
    let created = api::create_cluster(client, project_id, &request).await?;

    finish_created_cluster(client, poller, options, project_id, created.id).await
}

/// Build the create payload for the smallest dedicated topology in `spec`
pub fn dedicated_cluster_request(
    spec: &Specification,
    name: &str,
    root_password: &str,
) -> Result<CreateClusterRequest> {
    let (Some(tidb), Some(tikv)) = (spec.tidb.first(), spec.tikv.first()) else {
        return Err(CoreError::Validation(format!(
            "Invalid specification: no available TiDB({})/TiKV({}) specifications",
            spec.tidb.len(),
            spec.tikv.len()
        )));
    };

    Ok(CreateClusterRequest {
        name: name.to_string(),
        cluster_type: spec.cluster_type.clone(),
        cloud_provider: spec.cloud_provider.clone(),
        region: spec.region.clone(),
        config: ClusterConfig {
            root_password: root_password.to_string(),
            port: Some(DEFAULT_PORT),
            components: Components {
                tidb: Some(Component {
                    node_size: tidb.node_size.clone(),
                    storage_size_gib: 0,
                    node_quantity: tidb.node_quantity_range.min,
                }),
                tikv: Some(Component {
                    node_size: tikv.node_size.clone(),
                    storage_size_gib: tikv.storage_size_gib_range.min,
                    node_quantity: tikv.node_quantity_range.min,
                }),
                tiflash: None,
            },
            ip_access_list: vec![IpAccess::allow_all()],
        },
    })
}

async fn first_project_id(client: &ApiClient) -> Result<u64> {
    let projects = api::list_projects(client).await?;
    projects
        .first()
        .map(|project| project.id)
        .ok_or_else(|| CoreError::NotFound("project in current organization".to_string()))
}

async fn finish_created_cluster(
    client: &ApiClient,
    poller: &Poller,
    options: &WorkflowOptions,
    project_id: u64,
    cluster_id: u64,
) -> Result<ClusterOutcome> {
    info!(cluster_id, "Step 3: get cluster by id");
    let mut cluster = api::get_cluster(client, project_id, cluster_id).await?;

    if options.wait && !cluster.is_available() {
        cluster = wait_for_cluster_available(client, poller, project_id, cluster_id).await?;
    }
    let ready = cluster.is_available();

    let cleaned_up = if options.auto_cleanup {
        info!(cluster_id, "Step 4: delete cluster");
        api::delete_cluster(client, project_id, cluster_id).await?;
        true
    } else {
        false
    };

    Ok(ClusterOutcome {
        project_id,
        cluster_id,
        cluster,
        ready,
        cleaned_up,
    })
}

// =============================================================================
// Scale workflow
// =============================================================================

/// Build the scale payload that adds TiFlash capacity to `cluster`.
///
/// A cluster without TiFlash gets the specification's first TiFlash offering
/// at its minimum storage and its quantity *step*. A cluster that already has
/// TiFlash gains exactly one node with size and storage unchanged. TiDB and
/// TiKV are echoed back untouched.
pub fn tiflash_scale_request(
    cluster: &Cluster,
    spec: &Specification,
) -> Result<UpdateClusterRequest> {
    let components = &cluster.config.components;
    let current = components.tiflash.clone().unwrap_or_default();

    let tiflash = if current.is_provisioned() {
        Component {
            node_quantity: current.node_quantity + 1,
            ..current
        }
    } else {
        let offering = spec
            .tiflash
            .first()
            .ok_or_else(|| CoreError::NotFound("TiFlash specification".to_string()))?;
        Component {
            node_size: offering.node_size.clone(),
            storage_size_gib: offering.storage_size_gib_range.min,
            node_quantity: offering.node_quantity_range.step,
        }
    };

    Ok(UpdateClusterRequest {
        config: ClusterConfig {
            components: Components {
                tidb: components.tidb.clone(),
                tikv: components.tikv.clone(),
                tiflash: Some(tiflash),
            },
            ..Default::default()
        },
    })
}

/// PATCH the cluster with [`tiflash_scale_request`]; returns the sent payload
pub async fn add_tiflash_to_cluster(
    client: &ApiClient,
    project_id: u64,
    cluster: &Cluster,
    spec: &Specification,
) -> Result<UpdateClusterRequest> {
    let request = tiflash_scale_request(cluster, spec)?;
    api::update_cluster(client, project_id, cluster.id, &request).await?;
    Ok(request)
}

/// Add one TiFlash node (or the first TiFlash group) to an available cluster
///
/// This workflow:
/// 1. Fetches specifications and the cluster; the cluster must be `AVAILABLE`
/// 2. Matches the cluster's specification and PATCHes the new topology
/// 3. Re-fetches the cluster (optionally waiting for `AVAILABLE` again)
pub async fn scale_out_tiflash(
    client: &ApiClient,
    poller: &Poller,
    options: &WorkflowOptions,
    project_id: u64,
    cluster_id: u64,
) -> Result<ClusterOutcome> {
    let specs = api::list_specifications(client).await?;
    let cluster = api::get_cluster(client, project_id, cluster_id).await?;
    require_available(&cluster)?;

    let spec = api::find_specification_for_cluster(&specs, &cluster)?;

    info!(cluster_id, "Step 1: add TiFlash to cluster");
    add_tiflash_to_cluster(client, project_id, &cluster, spec).await?;

    info!("Step 2: check scale-out progress");
    let mut cluster = api::get_cluster(client, project_id, cluster_id).await?;
    if options.wait {
        cluster = wait_for_cluster_available(client, poller, project_id, cluster_id).await?;
    }

    Ok(ClusterOutcome {
        project_id,
        cluster_id,
        ready: cluster.is_available(),
        cluster,
        cleaned_up: false,
    })
}

fn require_available(cluster: &Cluster) -> Result<()> {
    if !cluster.is_available() {
        return Err(CoreError::InvalidState {
            resource: "cluster".to_string(),
            status: cluster.status().to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Backup workflow
// =============================================================================

/// Manual backup payload for `date`
pub fn backup_request(date: NaiveDate) -> CreateBackupRequest {
    let day = date.format("%Y-%m-%d");
    CreateBackupRequest {
        name: format!("tidbcloud-backup-{}", day),
        description: format!("tidbcloud backup created for demo in {}", day),
    }
}

/// Back up an available cluster and restore it into a new one
///
/// This workflow:
/// 1. Checks the source cluster is `AVAILABLE`
/// 2. Creates a manual backup
/// 3. With `wait`: waits for the backup, restores it into a new cluster with
///    the source topology, and waits for that cluster
/// 4. With `auto_cleanup`: deletes the backup and the restored cluster
///
/// Without `wait` only the backup is requested; a restore needs a finished
/// backup.
pub async fn backup_and_restore(
    client: &ApiClient,
    poller: &Poller,
    options: &WorkflowOptions,
    project_id: u64,
    cluster_id: u64,
) -> Result<BackupOutcome> {
    let root_password = if options.wait {
        Some(options.require_root_password()?)
    } else {
        None
    };

    info!(cluster_id, "Step 1: check cluster status");
    let cluster = api::get_cluster(client, project_id, cluster_id).await?;
    require_available(&cluster)?;

    info!(cluster_id, "Step 2: create backup");
    let request = backup_request(chrono::Local::now().date_naive());
    let backup_id = api::create_backup(client, project_id, cluster_id, &request)
        .await?
        .id;
    info!(backup_id, "backup requested");

    let mut outcome = BackupOutcome {
        project_id,
        cluster_id,
        backup_id,
        backup: None,
        restored_cluster_id: None,
        restored_cluster: None,
        cleaned_up: false,
    };

    if let Some(root_password) = root_password {
        let backup =
            wait_for_backup_success(client, poller, project_id, cluster_id, backup_id).await?;
        outcome.backup = Some(backup);

        info!(backup_id, "Step 3: restore cluster from backup");
        let restore = RestoreRequest {
            backup_id,
            name: options.restore_name.clone(),
            config: ClusterConfig {
                root_password: root_password.to_string(),
                port: Some(DEFAULT_PORT),
                components: cluster.config.components.clone(),
                ip_access_list: Vec::new(),
            },
        };
        let restored = api::restore_cluster(client, project_id, &restore).await?;
        outcome.restored_cluster_id = Some(restored.cluster_id);

        let restored_cluster =
            wait_for_cluster_available(client, poller, project_id, restored.cluster_id).await?;
        outcome.restored_cluster = Some(restored_cluster);
    } else {
        outcome.backup = Some(api::get_backup(client, project_id, cluster_id, backup_id).await?);
    }

    if options.auto_cleanup {
        info!(backup_id, "Step 4: delete backup");
        api::delete_backup(client, project_id, cluster_id, backup_id).await?;

        if let Some(restored_id) = outcome.restored_cluster_id {
            info!(cluster_id = restored_id, "Step 5: delete restored cluster");
            api::delete_cluster(client, project_id, restored_id).await?;
        }
        outcome.cleaned_up = true;
    } else if outcome.restored_cluster_id.is_some() {
        warn!("restored cluster left running; don't forget to delete it");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeOffering, QuantityRange, StorageRange};
    use pretty_assertions::assert_eq;

    fn spec_with_tiflash() -> Specification {
        Specification {
            cluster_type: "DEDICATED".to_string(),
            cloud_provider: "AWS".to_string(),
            region: "us-west-2".to_string(),
            tidb: vec![NodeOffering {
                node_size: "8C16G".to_string(),
                node_quantity_range: QuantityRange { min: 1, step: 1 },
                ..Default::default()
            }],
            tikv: vec![NodeOffering {
                node_size: "8C32G".to_string(),
                node_quantity_range: QuantityRange { min: 3, step: 3 },
                storage_size_gib_range: StorageRange { min: 500, max: 4096 },
            }],
            tiflash: vec![
                NodeOffering {
                    node_size: "8C64G".to_string(),
                    node_quantity_range: QuantityRange { min: 0, step: 2 },
                    storage_size_gib_range: StorageRange { min: 500, max: 2048 },
                },
                NodeOffering {
                    node_size: "16C128G".to_string(),
                    node_quantity_range: QuantityRange { min: 0, step: 1 },
                    storage_size_gib_range: StorageRange { min: 1000, max: 2048 },
                },
            ],
        }
    }

    fn cluster_with_tiflash(tiflash: Option<Component>) -> Cluster {
        Cluster {
            id: 9,
            cluster_type: "DEDICATED".to_string(),
            cloud_provider: "AWS".to_string(),
            region: "us-west-2".to_string(),
            config: ClusterConfig {
                components: Components {
                    tidb: Some(Component {
                        node_size: "8C16G".to_string(),
                        storage_size_gib: 0,
                        node_quantity: 2,
                    }),
                    tikv: Some(Component {
                        node_size: "8C32G".to_string(),
                        storage_size_gib: 500,
                        node_quantity: 3,
                    }),
                    tiflash,
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_tiflash_added_from_first_offering_when_empty() {
        let cluster = cluster_with_tiflash(Some(Component::default()));
        let request = tiflash_scale_request(&cluster, &spec_with_tiflash()).unwrap();

        assert_eq!(
            request.config.components.tiflash,
            Some(Component {
                node_size: "8C64G".to_string(),
                storage_size_gib: 500,
                node_quantity: 2,
            })
        );
        assert_eq!(request.config.components.tidb, cluster.config.components.tidb);
        assert_eq!(request.config.components.tikv, cluster.config.components.tikv);
    }

    #[test]
    fn test_tiflash_missing_component_treated_as_empty() {
        let cluster = cluster_with_tiflash(None);
        let request = tiflash_scale_request(&cluster, &spec_with_tiflash()).unwrap();
        assert_eq!(
            request.config.components.tiflash.unwrap().node_size,
            "8C64G"
        );
    }

    #[test]
    fn test_existing_tiflash_grows_by_one() {
        let existing = Component {
            node_size: "16C128G".to_string(),
            storage_size_gib: 1000,
            node_quantity: 2,
        };
        let cluster = cluster_with_tiflash(Some(existing.clone()));
        let request = tiflash_scale_request(&cluster, &spec_with_tiflash()).unwrap();

        assert_eq!(
            request.config.components.tiflash,
            Some(Component {
                node_quantity: 3,
                ..existing
            })
        );
    }

    #[test]
    fn test_tiflash_without_offering_is_not_found() {
        let cluster = cluster_with_tiflash(None);
        let spec = Specification {
            tiflash: Vec::new(),
            ..spec_with_tiflash()
        };
        let err = tiflash_scale_request(&cluster, &spec).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_dedicated_request_uses_minimums() {
        let request =
            dedicated_cluster_request(&spec_with_tiflash(), "sample", "secret").unwrap();

        assert_eq!(request.cluster_type, "DEDICATED");
        assert_eq!(request.config.port, Some(DEFAULT_PORT));
        assert_eq!(
            request.config.components.tikv,
            Some(Component {
                node_size: "8C32G".to_string(),
                storage_size_gib: 500,
                node_quantity: 3,
            })
        );
        assert_eq!(request.config.components.tidb.unwrap().node_quantity, 1);
        assert!(request.config.components.tiflash.is_none());
        assert_eq!(request.config.ip_access_list, vec![IpAccess::allow_all()]);
    }

    #[test]
    fn test_dedicated_request_needs_tidb_and_tikv() {
        let spec = Specification {
            tikv: Vec::new(),
            ..spec_with_tiflash()
        };
        let err = dedicated_cluster_request(&spec, "sample", "secret").unwrap_err();
        assert!(err.to_string().contains("TiDB(1)/TiKV(0)"));
    }

    #[test]
    fn test_backup_request_is_dated() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let request = backup_request(date);
        assert_eq!(request.name, "tidbcloud-backup-2024-03-09");
        assert!(request.description.ends_with("2024-03-09"));
    }

    #[test]
    fn test_root_password_required() {
        let options = WorkflowOptions::default();
        assert!(options.require_root_password().is_err());

        let options = WorkflowOptions {
            root_password: "secret".to_string(),
            ..Default::default()
        };
        assert_eq!(options.require_root_password().unwrap(), "secret");
    }
}
