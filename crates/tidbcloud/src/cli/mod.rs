//! CLI structure and command definitions
//!
//! Defines the command-line interface using clap derive. Resource commands
//! (`project`, `spec`, `cluster`, `backup`) live in [`resources`]; profile and
//! housekeeping commands live here.

use clap::{Parser, Subcommand};

pub mod resources;

pub use resources::*;

/// Command-line client for TiDB Cloud
#[derive(Parser, Debug)]
#[command(name = "tidbcloud")]
#[command(version, about = "Command-line client for TiDB Cloud clusters and backups")]
#[command(long_about = "
Command-line client for TiDB Cloud clusters and backups

Credentials come from TIDBCLOUD_PUBLIC_KEY / TIDBCLOUD_PRIVATE_KEY or from a
profile in the config file. Environment variables win over the profile.

EXAMPLES:
    # Save an API key pair as a profile
    tidbcloud profile set dev --public-key PUB --private-key PRIV

    # List projects
    tidbcloud project list

    # Create a dedicated cluster and wait until it is AVAILABLE
    tidbcloud cluster create-dedicated --root-password secret --wait

    # Add TiFlash to a cluster
    DEDICATED_PROJECT_ID=1 DEDICATED_CLUSTER_ID=2 tidbcloud cluster scale-out-tiflash --wait

    # Get JSON output for scripting
    tidbcloud cluster get --project-id 1 --cluster-id 2 -o json

For more help on a specific command, run:
    tidbcloud <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "TIDBCLOUD_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "TIDBCLOUD_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tables for humans
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Projects in the current organization
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Cluster specifications offered per provider and region
    #[command(subcommand, visible_alias = "specs")]
    Spec(SpecCommands),

    /// Cluster lifecycle
    #[command(subcommand, visible_alias = "cl")]
    Cluster(ClusterCommands),

    /// Backups and restores
    #[command(subcommand, visible_alias = "bk")]
    Backup(BackupCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile
    tidbcloud profile set dev --public-key PUB --private-key PRIV --project-id 1

    # List all profiles
    tidbcloud profile list

    # Make a profile the default
    tidbcloud profile default dev
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    Elvish,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile (private key redacted)
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// API public key
        #[arg(long)]
        public_key: String,

        /// API private key
        #[arg(long)]
        private_key: String,

        /// API base URL
        #[arg(long, default_value = tidbcloud_core::client::DEFAULT_API_URL)]
        api_url: String,

        /// Default project id for cluster and backup commands
        #[arg(long)]
        project_id: Option<u64>,

        /// Default cluster id for scale and backup commands
        #[arg(long)]
        cluster_id: Option<u64>,

        /// Delete resources created by workflows once they finish
        #[arg(long)]
        auto_cleanup: bool,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to use when --profile is not given
        name: String,
    },
}
