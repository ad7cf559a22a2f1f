//! Docker engine installation.
//!
//! Probes for an existing engine first; otherwise registers the Docker
//! package repository for the host's OS family and installs the engine
//! plus the compose plugin, then enables and starts the system service.

use std::path::Path;

use tokio::fs;

use crate::cli::OutputManager;
use crate::error::{OpsError, Result};
use crate::probe::{EnvironmentProfile, OsFamily};
use crate::process::ProcessRunner;

const APT_KEYRING_DIR: &str = "/etc/apt/keyrings";
const APT_DOCKER_KEY: &str = "/etc/apt/keyrings/docker.gpg";
const APT_DOCKER_LIST: &str = "/etc/apt/sources.list.d/docker.list";
const APT_DOCKER_KEY_URL: &str = "https://download.docker.com/linux/ubuntu/gpg";
const DNF_DOCKER_REPO: &str = "https://download.docker.com/linux/centos/docker-ce.repo";

const DOCKER_PACKAGES: [&str; 4] = [
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-compose-plugin",
];

/// OS-specific Docker installation recipe, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerRecipe {
    /// Debian-like hosts: apt repository + signing key
    Apt,
    /// RHEL-like hosts: yum/dnf repository
    Dnf,
}

impl DockerRecipe {
    /// Selects the recipe for an OS family, if one exists.
    pub fn for_family(family: OsFamily) -> Option<Self> {
        match family {
            OsFamily::Debian => Some(Self::Apt),
            OsFamily::Rhel => Some(Self::Dnf),
            _ => None,
        }
    }

    async fn install<R: ProcessRunner>(self, runner: &R, output: &OutputManager) -> Result<()> {
        match self {
            Self::Apt => install_apt(runner, output).await,
            Self::Dnf => install_dnf(runner).await,
        }
    }
}

/// Ensures the Docker engine and compose plugin are present and runnable.
///
/// Already-installed engines short-circuit, but then the compose plugin
/// must also be present; a missing plugin on an otherwise working engine
/// is fatal rather than something this tool tries to repair piecemeal.
pub async fn ensure_docker<R: ProcessRunner>(
    profile: &EnvironmentProfile,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    let probe = runner.run_captured("docker", &["--version"], None).await?;
    if probe.success {
        output.success(&format!("Docker already installed: {}", probe.stdout.trim()));

        let compose = runner
            .run_captured("docker", &["compose", "version"], None)
            .await?;
        if !compose.success {
            output.error("Docker Compose is not installed");
            return Err(OpsError::precondition(
                "docker is installed but the compose plugin is missing",
            ));
        }
        output.success(&format!(
            "Docker Compose already installed: {}",
            compose.stdout.trim()
        ));
        return Ok(());
    }

    let recipe = DockerRecipe::for_family(profile.os_family).ok_or_else(|| {
        OpsError::precondition(format!(
            "no Docker installation recipe for {}",
            profile.os_family
        ))
    })?;

    output.step(2, &format!("Installing Docker ({})", profile.os_family));
    recipe.install(runner, output).await?;

    // Post-condition: the engine must now answer its version probe.
    let verify = runner.run_captured("docker", &["--version"], None).await?;
    if !verify.success {
        return Err(OpsError::execution_failed(
            "docker --version",
            "Docker is still not runnable after installation",
        ));
    }

    output.success("Docker installation complete");
    Ok(())
}

async fn install_apt<R: ProcessRunner>(runner: &R, output: &OutputManager) -> Result<()> {
    runner.run_checked("apt-get", &["update"], None).await?;
    runner
        .run_checked(
            "apt-get",
            &["install", "-y", "ca-certificates", "curl", "gnupg", "lsb-release"],
            None,
        )
        .await?;

    fs::create_dir_all(APT_KEYRING_DIR).await?;

    // Fetch the signing key exactly once.
    if !Path::new(APT_DOCKER_KEY).exists() {
        runner
            .run_checked(
                "sh",
                &[
                    "-c",
                    &format!(
                        "curl -fsSL {} | gpg --dearmor -o {}",
                        APT_DOCKER_KEY_URL, APT_DOCKER_KEY
                    ),
                ],
                None,
            )
            .await?;
    } else {
        output.warn("Docker signing key already present, skipping fetch");
    }

    let arch = captured_value(runner, "dpkg", &["--print-architecture"]).await?;
    let codename = captured_value(runner, "lsb_release", &["-cs"]).await?;

    let entry = format!(
        "deb [arch={} signed-by={}] https://download.docker.com/linux/ubuntu {} stable\n",
        arch, APT_DOCKER_KEY, codename
    );
    fs::write(APT_DOCKER_LIST, entry).await?;

    runner.run_checked("apt-get", &["update"], None).await?;
    let mut install: Vec<&str> = vec!["install", "-y"];
    install.extend(DOCKER_PACKAGES);
    runner.run_checked("apt-get", &install, None).await?;

    runner.run_checked("systemctl", &["enable", "docker"], None).await?;
    runner.run_checked("systemctl", &["start", "docker"], None).await?;
    Ok(())
}

async fn install_dnf<R: ProcessRunner>(runner: &R) -> Result<()> {
    runner.run_checked("yum", &["install", "-y", "yum-utils"], None).await?;
    runner
        .run_checked(
            "yum-config-manager",
            &["--add-repo", DNF_DOCKER_REPO],
            None,
        )
        .await?;

    let mut install: Vec<&str> = vec!["install", "-y"];
    install.extend(DOCKER_PACKAGES);
    runner.run_checked("yum", &install, None).await?;

    runner.run_checked("systemctl", &["enable", "docker"], None).await?;
    runner.run_checked("systemctl", &["start", "docker"], None).await?;
    Ok(())
}

/// Runs a command whose single-line stdout feeds a configuration file.
/// A failure here would produce a garbage repository entry, so it is fatal.
async fn captured_value<R: ProcessRunner>(
    runner: &R,
    program: &str,
    args: &[&str],
) -> Result<String> {
    let result = runner.run_captured(program, args, None).await?;
    if !result.success {
        return Err(OpsError::execution_failed(
            crate::process::display_command(program, args),
            result.stderr,
        ));
    }
    Ok(result.stdout.trim().to_string())
}
