//! Command line interface for dify-ops.
//!
//! Parses arguments, enforces the elevation gate for the platform
//! lifecycle subcommands and dispatches to the deploy or plugin
//! pipeline.

mod args;
mod output;

pub use args::{Args, OpsCommand, PluginArgs, SourceKind};
pub use output::OutputManager;

use std::env;
use std::path::PathBuf;

use crate::deploy;
use crate::error::{OpsError, Result};
use crate::plugin;
use crate::plugin::debug::TerminalPrompt;
use crate::probe::EnvironmentProfile;
use crate::process::SystemRunner;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new();
    let runner = SystemRunner;

    match args.command {
        OpsCommand::Deploy { dir } => {
            require_root()?;
            let install_dir = match dir {
                Some(dir) => dir,
                None => env::current_dir()?,
            };
            let profile = EnvironmentProfile::detect();
            deploy::deploy(&install_dir, &profile, &runner, &output).await?;
            Ok(0)
        }
        OpsCommand::Stop { dir } => {
            require_root()?;
            deploy::stop(&resolve_dify_dir(dir)?, &runner, &output).await?;
            Ok(0)
        }
        OpsCommand::Restart { dir } => {
            require_root()?;
            deploy::restart(&resolve_dify_dir(dir)?, &runner, &output).await?;
            Ok(0)
        }
        OpsCommand::Upgrade { dir } => {
            require_root()?;
            deploy::upgrade(&resolve_dify_dir(dir)?, &runner, &output).await?;
            Ok(0)
        }
        OpsCommand::Plugin(plugin_args) => {
            let profile = EnvironmentProfile::detect();
            let mut prompt = TerminalPrompt;
            plugin::run(&plugin_args, &profile, &runner, &mut prompt, &output).await
        }
    }
}

/// Dify directory for stop/restart/upgrade: `--dir` or `<cwd>/dify`.
fn resolve_dify_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(env::current_dir()?.join("dify")),
    }
}

/// The platform lifecycle writes to /etc and drives systemd, so it must
/// run as root.
#[cfg(unix)]
fn require_root() -> Result<()> {
    if users::get_effective_uid() == 0 {
        Ok(())
    } else {
        Err(OpsError::precondition(
            "this subcommand must be run with root privileges",
        ))
    }
}

#[cfg(not(unix))]
fn require_root() -> Result<()> {
    Err(OpsError::precondition(
        "the platform lifecycle subcommands are only supported on Unix hosts",
    ))
}
