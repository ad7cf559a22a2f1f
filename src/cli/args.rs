//! Command line argument parsing and validation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Deployment and plugin lifecycle automation for self-hosted Dify
#[derive(Parser, Debug)]
#[command(
    name = "dify-ops",
    version,
    about = "Deployment and plugin lifecycle automation for self-hosted Dify",
    long_about = "Provisions a Docker-based Dify deployment and manages its plugin ecosystem.

Usage:
  dify-ops deploy --dir /opt
  dify-ops upgrade --dir /opt/dify
  dify-ops plugin https://github.com/acme/my-plugin.git --package-only
  dify-ops plugin ./my-plugin --type local --dify-dir /opt/dify --debug

deploy, stop, restart and upgrade must run with root privileges.
Exit code 0 = all required stages completed."
)]
pub struct Args {
    /// Workflow to run
    #[command(subcommand)]
    pub command: OpsCommand,
}

/// Top-level workflows
#[derive(Subcommand, Debug)]
pub enum OpsCommand {
    /// Provision Docker, fetch the Dify manifests and start the services
    Deploy {
        /// Installation directory (defaults to the working directory)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Stop the running Dify services
    Stop {
        /// Dify directory (defaults to ./dify)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Restart the running Dify services
    Restart {
        /// Dify directory (defaults to ./dify)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Pull the latest manifests and images, then recreate the services
    Upgrade {
        /// Dify directory (defaults to ./dify)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Package a plugin and optionally wire it up for remote debugging
    Plugin(PluginArgs),
}

/// Arguments for the plugin workflow
#[derive(clap::Args, Debug)]
pub struct PluginArgs {
    /// Plugin source: repository URL, owner/name, local path or catalog name
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Kind of the plugin source
    #[arg(long = "type", value_enum, default_value_t = SourceKind::Github)]
    pub kind: SourceKind,

    /// Dify installation directory (enables the signature-verification flag)
    #[arg(long, value_name = "PATH")]
    pub dify_dir: Option<PathBuf>,

    /// Launch a remote-debug session after packaging
    #[arg(long)]
    pub debug: bool,

    /// Only package the plugin, do not install or debug it
    #[arg(long)]
    pub package_only: bool,
}

/// Where a plugin source comes from
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Clone from a GitHub repository
    Github,
    /// Use a local directory in place
    Local,
    /// Install through the Dify Marketplace web console
    Marketplace,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
