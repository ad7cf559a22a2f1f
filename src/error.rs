//! Error types for deployment and plugin operations.
//!
//! This module defines all error types with actionable error messages,
//! mirroring the failure taxonomy of the provisioning pipelines: fatal
//! preconditions, fatal step failures, and everything else downgraded
//! to warnings at the call site.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deployment and plugin operations
pub type Result<T> = std::result::Result<T, OpsError>;

/// Main error type for all dify-ops operations
#[derive(Error, Debug)]
pub enum OpsError {
    /// CLI argument and command execution errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// A hard environment requirement is not met (memory, OS, privileges)
    #[error("Precondition failed: {reason}")]
    Precondition {
        /// Human-readable description of the unmet requirement
        reason: String,
    },

    /// A file the pipeline cannot proceed without is missing
    #[error("Required file not found: {path}")]
    MissingFile {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP download errors
    #[error("Download error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl OpsError {
    /// Builds the fatal error for a required external command that
    /// exited non-zero, including captured stderr where available.
    pub fn execution_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cli(CliError::ExecutionFailed {
            command: command.into(),
            reason: reason.into(),
        })
    }

    /// Builds a fatal precondition error.
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }
}
