//! Deployment and plugin lifecycle automation for self-hosted Dify.
//!
//! This library provides the provisioning stages behind the `dify-ops`
//! binary:
//! - Environment probing (OS family, architecture, CPU, memory)
//! - Docker engine and vendor CLI installation
//! - Deployment manifest and plugin source acquisition
//! - Environment file materialization
//! - `docker compose` service control
//! - Plugin packaging and remote-debug sessions
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod acquire;
pub mod cli;
pub mod compose;
pub mod config_env;
pub mod deploy;
pub mod error;
pub mod install;
pub mod plugin;
pub mod probe;
pub mod process;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{CliError, OpsError, Result};
