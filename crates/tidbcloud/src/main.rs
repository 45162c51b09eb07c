use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use tidbcloud_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{BackupCommands, ClusterCommands, Cli, Commands};
use connection::ConnectionManager;
use error::Result as CliResult;
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let mut conn_mgr = match load_connection_manager(cli.config_file.as_deref()) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = execute_command(&cli, &mut conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Load configuration from the given path or the default location
fn load_connection_manager(config_file: Option<&str>) -> CliResult<ConnectionManager> {
    let (config, config_path) = if let Some(config_file) = config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    debug!(
        "Creating ConnectionManager with config_path: {:?}",
        config_path
    );
    Ok(ConnectionManager::with_config_path(config, config_path))
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "tidbcloud=warn,tidbcloud_core=warn",
            1 => "tidbcloud=info,tidbcloud_core=info",
            2 => "tidbcloud=debug,tidbcloud_core=debug",
            _ => "tidbcloud=trace,tidbcloud_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &mut ConnectionManager) -> CliResult<()> {
    trace!(profile = ?cli.profile, output = ?cli.output, "Executing command");
    info!("Command: {}", format_command(&cli.command));

    let output_format = OutputFormat::from_cli(cli.output);
    let profile = cli.profile.as_deref();

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if output_format.is_table() {
                println!("tidbcloud {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            } else {
                output::print_output(
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    }),
                    output_format,
                )
            }
        }

        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, output_format).await
        }

        Commands::Project(cmd) => {
            commands::project::handle_project_command(cmd, conn_mgr, profile, output_format).await
        }

        Commands::Spec(cmd) => {
            commands::project::handle_spec_command(cmd, conn_mgr, profile, output_format).await
        }

        Commands::Cluster(cmd) => {
            commands::cluster::handle_cluster_command(cmd, conn_mgr, profile, output_format).await
        }

        Commands::Backup(cmd) => {
            commands::backup::handle_backup_command(cmd, conn_mgr, profile, output_format).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without secrets)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Project(_) => "project list".to_string(),
        Commands::Spec(_) => "spec list".to_string(),
        Commands::Cluster(cmd) => match cmd {
            ClusterCommands::Get { target } => format!("cluster get {:?}", target),
            ClusterCommands::Delete { target } => format!("cluster delete {:?}", target),
            ClusterCommands::CreateDeveloper { create } => {
                format!("cluster create-developer {} [password redacted]", create.name)
            }
            ClusterCommands::CreateDedicated { create } => {
                format!("cluster create-dedicated {} [password redacted]", create.name)
            }
            ClusterCommands::ScaleOutTiflash { target, .. } => {
                format!("cluster scale-out-tiflash {:?}", target)
            }
        },
        Commands::Backup(cmd) => match cmd {
            BackupCommands::Create { target, .. } => format!("backup create {:?}", target),
            BackupCommands::Get { backup_id, .. } => format!("backup get {}", backup_id),
            BackupCommands::Delete { backup_id, .. } => format!("backup delete {}", backup_id),
            BackupCommands::RestoreDemo { restore_name, .. } => {
                format!("backup restore-demo {} [password redacted]", restore_name)
            }
        },
    }
}
