//! Request and response bodies for the `v1beta` API
//!
//! Remote identifiers are opaque numeric handles. The API sends them as JSON
//! strings (`"id": "1379661944646413143"`), so they are decoded from either a
//! string or a number and always written back as strings.

use serde::{Deserialize, Serialize};

/// Cluster lifecycle status that means "ready for traffic"
pub const CLUSTER_AVAILABLE: &str = "AVAILABLE";
/// Cluster lifecycle status while provisioning
pub const CLUSTER_CREATING: &str = "CREATING";
/// Backup status once the backup is usable
pub const BACKUP_SUCCESS: &str = "SUCCESS";

pub const CLUSTER_TYPE_DEDICATED: &str = "DEDICATED";
pub const CLUSTER_TYPE_DEVELOPER: &str = "DEVELOPER";

/// Serde adapter for ids sent as strings
pub mod string_id {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) if s.is_empty() => Ok(0),
            Repr::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid id '{}': {}", s, e))),
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(with = "string_id")]
    pub id: u64,
    #[serde(default, with = "string_id")]
    pub org_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster_count: i64,
    #[serde(default)]
    pub user_count: i64,
    #[serde(default, with = "string_id")]
    pub create_timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub items: Vec<Project>,
    #[serde(default)]
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Specifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRange {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub step: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRange {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
}

/// One purchasable node size for a component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOffering {
    pub node_size: String,
    #[serde(default)]
    pub node_quantity_range: QuantityRange,
    #[serde(default)]
    pub storage_size_gib_range: StorageRange,
}

/// Topology offerings for one cluster type / provider / region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub cluster_type: String,
    pub cloud_provider: String,
    pub region: String,
    #[serde(default)]
    pub tidb: Vec<NodeOffering>,
    #[serde(default)]
    pub tikv: Vec<NodeOffering>,
    #[serde(default)]
    pub tiflash: Vec<NodeOffering>,
}

impl Specification {
    /// Whether this specification can back a cluster of the given placement
    pub fn matches(&self, cluster_type: &str, cloud_provider: &str, region: &str) -> bool {
        self.cluster_type == cluster_type
            && self.cloud_provider == cloud_provider
            && self.region == region
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationList {
    #[serde(default)]
    pub items: Vec<Specification>,
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAccess {
    pub cidr: String,
    #[serde(default)]
    pub description: String,
}

impl IpAccess {
    pub fn allow_all() -> Self {
        Self {
            cidr: "0.0.0.0/0".to_string(),
            description: "Allow Access from Anywhere.".to_string(),
        }
    }
}

/// Size class, storage, and count of one component group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub node_size: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub storage_size_gib: u32,
    #[serde(default)]
    pub node_quantity: u32,
}

impl Component {
    /// A component with no node size has not been provisioned
    pub fn is_provisioned(&self) -> bool {
        !self.node_size.is_empty()
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tidb: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tikv: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiflash: Option<Component>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub components: Components,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_access_list: Vec<IpAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default)]
    pub tidb_version: String,
    #[serde(default)]
    pub cluster_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStrings {
    #[serde(default)]
    pub standard: String,
    #[serde(default)]
    pub vpc_peering: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(with = "string_id")]
    pub id: u64,
    #[serde(default, with = "string_id")]
    pub project_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub tidb_version: String,
    #[serde(default)]
    pub cluster_type: String,
    #[serde(default)]
    pub cloud_provider: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub create_timestamp: String,
    #[serde(default)]
    pub config: ClusterConfig,
    #[serde(default)]
    pub connection_strings: ConnectionStrings,
}

impl Cluster {
    pub fn status(&self) -> &str {
        &self.status.cluster_status
    }

    pub fn is_available(&self) -> bool {
        self.status() == CLUSTER_AVAILABLE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub cluster_type: String,
    pub cloud_provider: String,
    pub region: String,
    pub config: ClusterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClusterResponse {
    #[serde(with = "string_id")]
    pub id: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClusterRequest {
    pub config: ClusterConfig,
}

// ---------------------------------------------------------------------------
// Backups and restores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(with = "string_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub backup_type: String,
    #[serde(default)]
    pub create_timestamp: String,
    #[serde(default, with = "string_id")]
    pub size: u64,
    #[serde(default)]
    pub status: String,
}

impl Backup {
    pub fn is_success(&self) -> bool {
        self.status == BACKUP_SUCCESS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateBackupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateBackupResponse {
    #[serde(with = "string_id")]
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreRequest {
    #[serde(with = "string_id")]
    pub backup_id: u64,
    pub name: String,
    pub config: ClusterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreResponse {
    #[serde(with = "string_id")]
    pub id: u64,
    #[serde(with = "string_id")]
    pub cluster_id: u64,
}
