//! Operator tool error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving configuration, reading the schema file or
/// talking to the hosted database.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpsError {
    /// Required environment variable absent or empty
    #[error("{name} environment variable not found")]
    ConfigurationMissing { name: String, hint: String },

    /// Environment variable present but unusable
    #[error("{name} is invalid: {reason}")]
    InvalidConfiguration { name: String, reason: String },

    /// Schema file missing or unreadable
    #[error("Cannot read schema file {}: {reason}", .path.display())]
    FileAccess { path: PathBuf, reason: String },

    /// Transport failure before any HTTP response was received
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Credential rejected by the service
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Queried table or view does not exist
    #[error("Relation '{relation}' does not exist")]
    SchemaAbsence { relation: String },

    /// Credential accepted but not allowed to read the relation
    #[error("Permission denied on '{relation}': {message}")]
    PermissionDenied { relation: String, message: String },

    /// Any other non-success HTTP status
    #[error("Unexpected response (HTTP {status}): {message}")]
    UnexpectedResponse { status: u16, message: String },
}

impl OpsError {
    /// Short name of the error kind, used as the headline of failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            OpsError::ConfigurationMissing { .. } => "ConfigurationMissing",
            OpsError::InvalidConfiguration { .. } => "InvalidConfiguration",
            OpsError::FileAccess { .. } => "FileAccessError",
            OpsError::Connectivity(_) => "ConnectivityError",
            OpsError::Authentication(_) => "AuthenticationError",
            OpsError::SchemaAbsence { .. } => "SchemaAbsenceError",
            OpsError::PermissionDenied { .. } => "PermissionDenied",
            OpsError::UnexpectedResponse { .. } => "UnexpectedResponse",
        }
    }

    /// True for failures that affect every request of a run, as opposed to a
    /// single relation.
    pub fn is_run_wide(&self) -> bool {
        matches!(
            self,
            OpsError::Connectivity(_) | OpsError::Authentication(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;
