//! Error types for idracctl
//!
//! Library errors are folded into [`CliError`] so each failure can carry
//! suggestions that fit the command line.

use colored::Colorize;
use idracctl_core::config::ConfigError;
use idracctl_core::{CoreError, TransportError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// ```text
/// error: Profile 'lab' not found
///
///   tip: List available profiles: idracctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
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

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the idracctl application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'idracctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller error: {message}")]
    ControllerError {
        message: String,
        /// Extended info lines reported by the controller
        details: Vec<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for idracctl operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::ProfileNotFound { name } => vec![
                "List available profiles: idracctl profile list".to_string(),
                format!(
                    "Create profile '{}': idracctl profile set {} --url <url> --username <user>",
                    name, name
                ),
            ],
            CliError::NoProfileConfigured => vec![
                "Create a profile: idracctl profile set <name> --url <url> --username <user>"
                    .to_string(),
                "Or set IDRACCTL_URL, IDRACCTL_USERNAME and IDRACCTL_PASSWORD".to_string(),
            ],
            CliError::AuthenticationFailed { .. } => vec![
                "Check your credentials: idracctl profile show <profile>".to_string(),
                "Passwords may come from IDRACCTL_PASSWORD when not stored".to_string(),
            ],
            CliError::ConnectionError { message }
                if message.contains("certificate") || message.contains("SSL") =>
            {
                vec![
                    "iDRAC ships a self-signed certificate; try a profile with --insecure"
                        .to_string(),
                    "Check that the controller URL is correct and reachable".to_string(),
                ]
            }
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity to the controller".to_string(),
                "A controller that was just reset can take several minutes to return".to_string(),
            ],
            CliError::ControllerError { .. } => vec![
                "Inspect outstanding jobs: idracctl jobs list --unfinished".to_string(),
                "Recover a stuck queue: idracctl known-good-state".to_string(),
            ],
            CliError::Timeout { .. } => vec![
                "Raise the retry budgets under [profiles.<name>.retry]".to_string(),
            ],
            CliError::InvalidInput { .. } => vec![
                "Check the command syntax: idracctl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let CliError::ControllerError { details, .. } = self
            && !details.is_empty()
        {
            diag = diag.detail(&details.join("\n  "));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<TransportError> for CliError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized { message, .. } => {
                CliError::AuthenticationFailed { message }
            }
            TransportError::Connection(message) => CliError::ConnectionError { message },
            TransportError::Timeout(message) => CliError::Timeout { message },
            TransportError::InvalidUri { uri, reason } => CliError::InvalidInput {
                message: format!("{}: {}", uri, reason),
            },
            other => {
                let details = other
                    .report()
                    .entries
                    .iter()
                    .map(|e| format!("{}: {}", e.message_id, e.message))
                    .collect();
                CliError::ControllerError {
                    message: other.to_string(),
                    details,
                }
            }
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidParameter(message) => CliError::InvalidInput { message },
            CoreError::Config(message) => CliError::Configuration(message),
            CoreError::PowerTransitionTimeout { .. } => CliError::Timeout {
                message: err.to_string(),
            },
            CoreError::Connection { message, .. } => CliError::ConnectionError { message },
            CoreError::RemoteOperation { operation, source } => match CliError::from(source) {
                CliError::ControllerError { message, details } => CliError::ControllerError {
                    message: format!("{} failed: {}", operation, message),
                    details,
                },
                other => other,
            },
            CoreError::MissingLink(_) => CliError::ControllerError {
                message: err.to_string(),
                details: Vec::new(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => CliError::NoProfileConfigured,
            other => CliError::Configuration(other.to_string()),
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
        CliError::Configuration(format!("{:#}", err))
    }
}
