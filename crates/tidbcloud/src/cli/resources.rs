//! Resource commands: projects, specifications, clusters, backups

use clap::{Args, Subcommand};

/// Project and cluster ids; fall back to env vars and the profile
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Project id (default: DEDICATED_PROJECT_ID or the profile's project_id)
    #[arg(long)]
    pub project_id: Option<u64>,

    /// Cluster id (default: DEDICATED_CLUSTER_ID or the profile's cluster_id)
    #[arg(long)]
    pub cluster_id: Option<u64>,
}

/// Convergence wait controls shared by long-running commands
#[derive(Args, Debug, Clone, Default)]
pub struct WaitArgs {
    /// Wait for the resource to become ready (Ctrl+C stops waiting)
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds (default: profile setting, 0 = no limit)
    #[arg(long, requires = "wait")]
    pub wait_timeout: Option<u64>,

    /// Polling interval in seconds (default: profile setting)
    #[arg(long, requires = "wait")]
    pub wait_interval: Option<u64>,
}

/// Options for workflows that create clusters
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Cluster name
    #[arg(long, default_value = "tidbcloud-sample-1")]
    pub name: String,

    /// Root password for the new cluster
    #[arg(long, env = "TIDBCLOUD_ROOT_PASSWORD", hide_env_values = true)]
    pub root_password: String,

    /// Delete the cluster again once the workflow finishes
    #[arg(long)]
    pub auto_cleanup: bool,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects
    #[command(visible_alias = "ls")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum SpecCommands {
    /// List cluster specifications per provider and region
    #[command(visible_alias = "ls")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Show one cluster
    #[command(visible_alias = "show")]
    Get {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Delete a cluster
    #[command(visible_alias = "rm")]
    Delete {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Create a developer-tier cluster in the first project
    #[command(after_help = "EXAMPLES:
    tidbcloud cluster create-developer --root-password secret --wait
")]
    CreateDeveloper {
        #[command(flatten)]
        create: CreateArgs,
    },

    /// Create a dedicated cluster with the smallest available topology
    #[command(after_help = "EXAMPLES:
    tidbcloud cluster create-dedicated --name demo --root-password secret --wait --auto-cleanup
")]
    CreateDedicated {
        #[command(flatten)]
        create: CreateArgs,
    },

    /// Add TiFlash capacity to an AVAILABLE cluster
    ScaleOutTiflash {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Request a manual backup
    Create {
        #[command(flatten)]
        target: TargetArgs,

        /// Backup name (default: tidbcloud-backup-<date>)
        #[arg(long)]
        name: Option<String>,

        /// Backup description
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show one backup
    #[command(visible_alias = "show")]
    Get {
        #[command(flatten)]
        target: TargetArgs,

        /// Backup id
        #[arg(long)]
        backup_id: u64,
    },

    /// Delete a backup
    #[command(visible_alias = "rm")]
    Delete {
        #[command(flatten)]
        target: TargetArgs,

        /// Backup id
        #[arg(long)]
        backup_id: u64,
    },

    /// Back up a cluster and restore it into a new one
    #[command(after_help = "EXAMPLES:
    tidbcloud backup restore-demo --cluster-id 2 --root-password secret --wait --auto-cleanup
")]
    RestoreDemo {
        #[command(flatten)]
        target: TargetArgs,

        /// Name for the restored cluster
        #[arg(long, default_value = "tidbcloud-sample-restore")]
        restore_name: String,

        /// Root password for the restored cluster (needed with --wait)
        #[arg(
            long,
            env = "TIDBCLOUD_ROOT_PASSWORD",
            hide_env_values = true,
            required_if_eq("wait", "true")
        )]
        root_password: Option<String>,

        /// Delete the backup and the restored cluster at the end
        #[arg(long)]
        auto_cleanup: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },
}
