//! Error types for the tidbcloud CLI
//!
//! Every failure is mapped onto a [`CliError`] so `main` can print a
//! diagnostic and exit with a code that tells scripts which layer failed.

use colored::Colorize;
use thiserror::Error;
use tidbcloud_core::{ConfigError, CoreError};

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Missing API credentials
///   Set TIDBCLOUD_PUBLIC_KEY and TIDBCLOUD_PRIVATE_KEY
///
///   tip: list configured profiles:
///       tidbcloud profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the tidbcloud application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("Missing {what}")]
    Missing { what: String, suggestion: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: HTTP {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Unexpected response: {message}")]
    DecodeError { message: String },

    #[error("Gave up waiting: {message}")]
    Convergence { message: String },

    #[error("{message}")]
    InvalidState { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for tidbcloud operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Process exit code; distinct per failure layer
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_)
            | CliError::ProfileNotFound { .. }
            | CliError::Missing { .. }
            | CliError::InvalidInput { .. } => 2,
            CliError::AuthenticationFailed { .. } | CliError::ApiError { .. } => 3,
            CliError::ConnectionError { .. } => 4,
            CliError::DecodeError { .. } => 5,
            CliError::Convergence { .. } => 6,
            CliError::InvalidState { .. } | CliError::NotFound { .. } => 7,
            CliError::OutputError { .. } => 1,
        }
    }

    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::ProfileNotFound { name } => vec![
                "List available profiles: tidbcloud profile list".to_string(),
                format!(
                    "Create profile '{}': tidbcloud profile set {} --public-key <key> --private-key <key>",
                    name, name
                ),
            ],
            CliError::AuthenticationFailed { .. } => vec![
                "Check your API key pair: tidbcloud profile show <profile>".to_string(),
                "Verify TIDBCLOUD_PUBLIC_KEY and TIDBCLOUD_PRIVATE_KEY if set".to_string(),
            ],
            CliError::ApiError { status: 404, .. } => vec![
                "Verify the project and cluster ids are correct".to_string(),
                "List projects to find the correct id: tidbcloud project list".to_string(),
            ],
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL: tidbcloud profile show <profile>".to_string(),
            ],
            CliError::Convergence { .. } => vec![
                "Check the resource status: tidbcloud cluster get".to_string(),
                "Raise the limit with --wait-timeout".to_string(),
            ],
            CliError::InvalidState { .. } => {
                vec!["Wait until the cluster is AVAILABLE and retry".to_string()]
            }
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));
        if let CliError::Missing { suggestion, .. } = self {
            diag = diag.detail(suggestion);
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api { status, body } if status == 401 || status == 403 => {
                CliError::AuthenticationFailed {
                    message: format!("HTTP {}: {}", status, body),
                }
            }
            CoreError::Api { status, body } => CliError::ApiError { status, body },
            CoreError::Auth(message) => CliError::AuthenticationFailed { message },
            CoreError::Transport(e) => CliError::ConnectionError {
                message: e.to_string(),
            },
            err @ CoreError::Decode { .. } => CliError::DecodeError {
                message: err.to_string(),
            },
            err @ (CoreError::ConvergenceTimeout { .. }
            | CoreError::ConvergenceCancelled { .. }
            | CoreError::LookupFailed { .. }) => CliError::Convergence {
                message: err.to_string(),
            },
            err @ CoreError::InvalidState { .. } => CliError::InvalidState {
                message: err.to_string(),
            },
            err @ CoreError::NotFound(_) => CliError::NotFound {
                message: err.to_string(),
            },
            CoreError::Validation(message) => CliError::InvalidInput { message },
            CoreError::Config(message) => CliError::Config(message),
            CoreError::Encode(e) => CliError::OutputError {
                message: format!("failed to encode request: {}", e),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound { name },
            ConfigError::Missing { what, suggestion } => CliError::Missing { what, suggestion },
            err @ ConfigError::InvalidId { .. } => CliError::InvalidInput {
                message: err.to_string(),
            },
            other => CliError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(format!("{:#}", err))
    }
}
