//! Endpoint helpers, one per API call
//!
//! Each helper formats the path, calls the matching [`ApiClient`] method,
//! and returns the decoded body. No helper retries or waits.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::{CoreError, Result};
use crate::models::{
    Backup, CLUSTER_TYPE_DEDICATED, Cluster, CreateBackupRequest, CreateBackupResponse,
    CreateClusterRequest, CreateClusterResponse, Project, ProjectList, RestoreRequest,
    RestoreResponse, Specification, SpecificationList, UpdateClusterRequest,
};

const API_PREFIX: &str = "/api/v1beta";

fn cluster_path(project_id: u64, cluster_id: u64) -> String {
    format!("{}/projects/{}/clusters/{}", API_PREFIX, project_id, cluster_id)
}

fn backup_path(project_id: u64, cluster_id: u64, backup_id: u64) -> String {
    format!(
        "{}/backups/{}",
        cluster_path(project_id, cluster_id),
        backup_id
    )
}

/// `GET /clusters/provider/regions`
pub async fn list_specifications(client: &ApiClient) -> Result<SpecificationList> {
    let url = client.endpoint(&format!("{}/clusters/provider/regions", API_PREFIX));
    client.get(&url).await
}

/// `GET /projects`
pub async fn list_projects(client: &ApiClient) -> Result<Vec<Project>> {
    let url = client.endpoint(&format!("{}/projects", API_PREFIX));
    let list: ProjectList = client.get(&url).await?;
    debug!(total = list.total, "listed projects");
    Ok(list.items)
}

/// `POST /projects/{project_id}/clusters`
pub async fn create_cluster(
    client: &ApiClient,
    project_id: u64,
    request: &CreateClusterRequest,
) -> Result<CreateClusterResponse> {
    let url = client.endpoint(&format!("{}/projects/{}/clusters", API_PREFIX, project_id));
    client.post(&url, request).await
}

/// `GET /projects/{project_id}/clusters/{cluster_id}`
pub async fn get_cluster(client: &ApiClient, project_id: u64, cluster_id: u64) -> Result<Cluster> {
    let url = client.endpoint(&cluster_path(project_id, cluster_id));
    client.get(&url).await
}

/// `PATCH /projects/{project_id}/clusters/{cluster_id}`
pub async fn update_cluster(
    client: &ApiClient,
    project_id: u64,
    cluster_id: u64,
    request: &UpdateClusterRequest,
) -> Result<()> {
    let url = client.endpoint(&cluster_path(project_id, cluster_id));
    client.patch(&url, request).await?;
    Ok(())
}

/// `DELETE /projects/{project_id}/clusters/{cluster_id}`
pub async fn delete_cluster(client: &ApiClient, project_id: u64, cluster_id: u64) -> Result<()> {
    let url = client.endpoint(&cluster_path(project_id, cluster_id));
    client.delete(&url).await?;
    Ok(())
}

/// `POST /projects/{project_id}/clusters/{cluster_id}/backups`
pub async fn create_backup(
    client: &ApiClient,
    project_id: u64,
    cluster_id: u64,
    request: &CreateBackupRequest,
) -> Result<CreateBackupResponse> {
    let url = client.endpoint(&format!(
        "{}/backups",
        cluster_path(project_id, cluster_id)
    ));
    client.post(&url, request).await
}

/// `GET /projects/{project_id}/clusters/{cluster_id}/backups/{backup_id}`
pub async fn get_backup(
    client: &ApiClient,
    project_id: u64,
    cluster_id: u64,
    backup_id: u64,
) -> Result<Backup> {
    let url = client.endpoint(&backup_path(project_id, cluster_id, backup_id));
    client.get(&url).await
}

/// `DELETE /projects/{project_id}/clusters/{cluster_id}/backups/{backup_id}`
pub async fn delete_backup(
    client: &ApiClient,
    project_id: u64,
    cluster_id: u64,
    backup_id: u64,
) -> Result<()> {
    let url = client.endpoint(&backup_path(project_id, cluster_id, backup_id));
    client.delete(&url).await?;
    Ok(())
}

/// `POST /projects/{project_id}/restores`
pub async fn restore_cluster(
    client: &ApiClient,
    project_id: u64,
    request: &RestoreRequest,
) -> Result<RestoreResponse> {
    let url = client.endpoint(&format!("{}/projects/{}/restores", API_PREFIX, project_id));
    client.post(&url, request).await
}

/// First `DEDICATED` specification in the list
pub fn find_dedicated_specification(specs: &SpecificationList) -> Result<&Specification> {
    specs
        .items
        .iter()
        .find(|spec| spec.cluster_type == CLUSTER_TYPE_DEDICATED)
        .ok_or_else(|| CoreError::NotFound("specification".to_string()))
}

/// Specification matching the cluster's type, provider, and region
pub fn find_specification_for_cluster<'a>(
    specs: &'a SpecificationList,
    cluster: &Cluster,
) -> Result<&'a Specification> {
    specs
        .items
        .iter()
        .find(|spec| spec.matches(&cluster.cluster_type, &cluster.cloud_provider, &cluster.region))
        .ok_or_else(|| CoreError::NotFound("specification".to_string()))
}
