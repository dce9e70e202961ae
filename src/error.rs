//! Error types for table-gate
//!
//! This module defines the error hierarchy used throughout the crate.
//! Denials (`NotAuthorized`, `ProtectedTable`) are surfaced to the host as-is;
//! policy load failures never leave the policy store.

use thiserror::Error;

/// Error returned to the host for a gated table operation
#[derive(Error, Debug)]
pub enum GateError {
    #[error("{0}")]
    NotAuthorized(#[from] AccessDeniedError),

    #[error("{0}")]
    ProtectedTable(#[from] ProtectedTableError),
}

impl GateError {
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, GateError::NotAuthorized(_))
    }

    pub fn is_protected_table(&self) -> bool {
        matches!(self, GateError::ProtectedTable(_))
    }
}

/// The acting identity is absent or not an administrator
#[derive(Error, Debug)]
#[error(
    "User {identity} is not the Administrator. non-administrator cannot operate \
     (include create/delete/modify/truncate) table '{table}', but can operate the table \
     which is prefixed with {prefixes}, please contact the administrator ({contact})."
)]
pub struct AccessDeniedError {
    pub identity: String,
    pub table: String,
    pub prefixes: String,
    pub contact: String,
}

impl AccessDeniedError {
    pub fn new(
        identity: Option<&str>,
        table: impl Into<String>,
        exempt_prefixes: &[String],
        contact: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.unwrap_or("<unknown>").to_string(),
            table: table.into(),
            prefixes: exempt_prefixes
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(" or "),
            contact: contact.into(),
        }
    }
}

/// Delete attempted against a protected table
#[derive(Error, Debug)]
#[error(
    "Table {table} can not be deleted (protected by pattern '{pattern}'). \
     if you want to, please contact the administrator ({contact})."
)]
pub struct ProtectedTableError {
    pub table: String,
    pub pattern: String,
    pub contact: String,
}

impl ProtectedTableError {
    pub fn new(
        table: impl Into<String>,
        pattern: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            pattern: pattern.into(),
            contact: contact.into(),
        }
    }
}

/// Failure to locate, stat or parse the policy resource
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error on policy resource {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy resource {location}: {reason}")]
    Parse { location: String, reason: String },

    #[error("Unsupported policy resource location '{0}': only file paths and file:// URLs")]
    UnsupportedLocation(String),
}

/// Gate configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid policy location: {0}")]
    Location(#[from] PolicyError),
}

/// Result type alias for gate checks
pub type GateResult<T> = std::result::Result<T, GateError>;
