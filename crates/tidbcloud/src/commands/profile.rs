//! Profile management command implementations

use colored::Colorize;
use serde_json::{Value, json};
use tidbcloud_core::{Config, Profile};
use tracing::{debug, info};

use crate::cli::ProfileCommands;
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result as CliResult};
use crate::output::{self, OutputFormat};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &mut ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            public_key,
            private_key,
            api_url,
            project_id,
            cluster_id,
            auto_cleanup,
            default,
        } => {
            let existing = conn_mgr.config.profiles.get(name).cloned();
            let profile = ProfileUpdate {
                public_key,
                private_key,
                api_url,
                project_id: *project_id,
                cluster_id: *cluster_id,
                auto_cleanup: *auto_cleanup,
            }
            .apply(existing);
            handle_set(conn_mgr, name, profile, *default)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
    }
}

/// Values from `profile set`; unset ids keep what the profile already had
struct ProfileUpdate<'a> {
    public_key: &'a str,
    private_key: &'a str,
    api_url: &'a str,
    project_id: Option<u64>,
    cluster_id: Option<u64>,
    auto_cleanup: bool,
}

impl ProfileUpdate<'_> {
    fn apply(self, existing: Option<Profile>) -> Profile {
        let mut profile = existing.unwrap_or_else(|| Profile::new("", ""));
        profile.public_key = self.public_key.to_string();
        profile.private_key = self.private_key.to_string();
        profile.api_url = self.api_url.to_string();
        if self.project_id.is_some() {
            profile.project_id = self.project_id;
        }
        if self.cluster_id.is_some() {
            profile.cluster_id = self.cluster_id;
        }
        if self.auto_cleanup {
            profile.settings.auto_cleanup = true;
        }
        profile
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config = &conn_mgr.config;
    let profiles = config.list_profiles();
    debug!("Found {} profiles", profiles.len());

    if !output_format.is_table() {
        let items: Vec<Value> = profiles
            .iter()
            .map(|(name, profile)| {
                let mut item = profile_json(name, profile);
                item["is_default"] = json!(config.default_profile.as_deref() == Some(name.as_str()));
                item
            })
            .collect();
        return output::print_output(json!(items), output_format);
    }

    if profiles.is_empty() {
        println!("No profiles configured.");
        println!("Use 'tidbcloud profile set' to create a profile.");
        return Ok(());
    }

    if let Some(path) = conn_mgr.display_path() {
        println!("{} {}", "Configuration file:".dimmed(), path);
        println!();
    }

    for (name, profile) in profiles {
        if config.default_profile.as_deref() == Some(name.as_str()) {
            println!("  {} {}", name.bold().cyan(), "(default)".green());
        } else {
            println!("  {}", name.bold().cyan());
        }
        println!("    {} {}", "URL:".dimmed(), profile.api_url);
        println!("    {} {}", "Key:".dimmed(), profile.public_key);
        if let Some(project_id) = profile.project_id {
            println!("    {} {}", "Project:".dimmed(), project_id);
        }
        if let Some(cluster_id) = profile.cluster_id {
            println!("    {} {}", "Cluster:".dimmed(), cluster_id);
        }
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if output_format.is_table() {
        println!("{}", config_path.display());
        Ok(())
    } else {
        output::print_output(
            json!({"config_path": config_path.display().to_string()}),
            output_format,
        )
    }
}

fn handle_show(conn_mgr: &ConnectionManager, name: &str, output_format: OutputFormat) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| CliError::ProfileNotFound { name: name.into() })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    if !output_format.is_table() {
        let mut data = profile_json(name, profile);
        data["is_default"] = json!(is_default);
        data["settings"] = serde_json::to_value(&profile.settings)?;
        return output::print_output(data, output_format);
    }

    println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
    println!("URL: {}", profile.api_url);
    println!("Public key: {}", profile.public_key);
    println!("Private key: {}", redact(&profile.private_key));
    if let Some(project_id) = profile.project_id {
        println!("Project id: {}", project_id);
    }
    if let Some(cluster_id) = profile.cluster_id {
        println!("Cluster id: {}", cluster_id);
    }
    let settings = &profile.settings;
    println!("Request timeout: {}s", settings.request_timeout_secs);
    println!("Poll interval: {}s", settings.poll_interval_secs);
    if settings.poll_timeout_secs == 0 {
        println!("Poll timeout: none");
    } else {
        println!("Poll timeout: {}s", settings.poll_timeout_secs);
    }
    println!("Auto cleanup: {}", settings.auto_cleanup);
    Ok(())
}

fn handle_set(
    conn_mgr: &mut ConnectionManager,
    name: &str,
    profile: Profile,
    make_default: bool,
) -> CliResult<()> {
    let replaced = conn_mgr.config.profiles.contains_key(name);
    conn_mgr.config.set_profile(name.to_string(), profile);

    // First profile becomes the default
    if make_default || conn_mgr.config.profiles.len() == 1 {
        conn_mgr.config.default_profile = Some(name.to_string());
    }

    conn_mgr.save_config()?;
    info!("Saved profile '{}'", name);

    if replaced {
        println!("Profile '{}' updated.", name);
    } else {
        println!("Profile '{}' created.", name);
    }
    if conn_mgr.config.default_profile.as_deref() == Some(name) {
        println!("'{}' is the default profile.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    let was_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if conn_mgr.config.remove_profile(name).is_none() {
        return Err(CliError::ProfileNotFound { name: name.into() });
    }

    conn_mgr.save_config()?;
    println!("Profile '{}' removed.", name);
    if was_default {
        println!(
            "{} '{}' was the default profile; set a new one with 'tidbcloud profile default <name>'.",
            "warning:".yellow().bold(),
            name
        );
    }
    Ok(())
}

fn handle_default(conn_mgr: &mut ConnectionManager, name: &str) -> CliResult<()> {
    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(CliError::ProfileNotFound { name: name.into() });
    }

    conn_mgr.config.default_profile = Some(name.to_string());
    conn_mgr.save_config()?;
    println!("Default profile set to '{}'.", name);
    Ok(())
}

fn profile_json(name: &str, profile: &Profile) -> Value {
    json!({
        "name": name,
        "api_url": profile.api_url,
        "public_key": profile.public_key,
        "private_key": redact(&profile.private_key),
        "project_id": profile.project_id.map(|id| id.to_string()),
        "cluster_id": profile.cluster_id.map(|id| id.to_string()),
    })
}

/// Keep the first four characters of a secret
fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}
