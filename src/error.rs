//! Error handling module for install-tools
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every fallible operation in the library returns [`InstallError`].

use thiserror::Error;

/// Main error type for the installation engine
#[derive(Error, Debug)]
pub enum InstallError {
    /// The external program could not be started at all
    #[error("Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    /// The external program ran and exited non-zero
    #[error("{program} failed (exit code {code}): {stderr}")]
    ToolFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// Configuration errors (missing fields, invalid combinations, missing files)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested cloud variant is not one we know how to install
    #[error("Unsupported cloud selected: {requested}. Use one of: {}", supported.join(", "))]
    UnsupportedCloud {
        requested: String,
        supported: Vec<String>,
    },

    /// No template text exists for the requested name
    #[error("Template not found for requested cloud: {cloud}. Use one of: {}", supported.join(", "))]
    TemplateNotFound {
        cloud: String,
        supported: Vec<String>,
    },

    /// Template syntax or rendering errors
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Registry login was rejected
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Job tracker refused a request
    #[error("Job error: {0}")]
    Job(String),

    /// Unexpected fault caught at the job boundary
    #[error("Unexpected fault: {0}")]
    Unexpected(String),

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for install-tools operations
pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a job error
    pub fn job(msg: impl Into<String>) -> Self {
        Self::Job(msg.into())
    }

    /// Create an unexpected-fault error
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Returns true for errors caused by configuration rather than by a tool
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedCloud { .. }
                | Self::TemplateNotFound { .. }
                | Self::Template(_)
        )
    }
}
