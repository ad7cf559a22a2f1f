//! Dify vendor CLI installation.
//!
//! Prefers a Homebrew-based install where brew is available, falling
//! back on Linux to downloading a prebuilt binary matched to the host
//! OS and architecture from the plugin daemon's release endpoint.

use std::path::Path;

use tokio::fs;

use crate::cli::OutputManager;
use crate::error::Result;
use crate::probe::{Arch, EnvironmentProfile, OsFamily};
use crate::process::ProcessRunner;

const RELEASE_DOWNLOAD_BASE: &str =
    "https://github.com/langgenius/dify-plugin-daemon/releases/latest/download";
const CLI_INSTALL_PATH: &str = "/usr/local/bin/dify";
const BREW_TAP: &str = "langgenius/dify";

/// Ensures the `dify` CLI is present and runnable.
///
/// Returns `Ok(true)` when the CLI answers its version probe, and
/// `Ok(false)` for the reported-but-non-fatal failures (unsupported
/// platform, missing Homebrew on macOS, failed download); the caller
/// decides whether to continue.
pub async fn ensure_dify_cli<R: ProcessRunner>(
    profile: &EnvironmentProfile,
    runner: &R,
    output: &OutputManager,
) -> Result<bool> {
    let probe = runner.run_captured("dify", &["version"], None).await?;
    if probe.success {
        output.success(&format!("Dify CLI already installed: {}", probe.stdout.trim()));
        return Ok(true);
    }

    let os_token = match profile.os_family.release_token() {
        Some(token) if profile.arch != Arch::Unknown => token,
        _ => {
            output.error(&format!(
                "Unsupported system or architecture: {}/{}",
                profile.os_family, profile.arch
            ));
            return Ok(false);
        }
    };

    match profile.os_family {
        OsFamily::Darwin => {
            if !install_via_brew(runner, output).await? {
                output.warn(
                    "Homebrew is recommended on macOS: \
                     /bin/bash -c \"$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)\"",
                );
                return Ok(false);
            }
        }
        _ => {
            if !install_via_brew(runner, output).await? {
                output.plain("Downloading prebuilt binary...");
                if let Err(e) = download_cli(os_token, profile.arch).await {
                    output.error(&format!("Download failed: {}", e));
                    return Ok(false);
                }
                output.success("Dify CLI installed");
            }
        }
    }

    let verify = runner.run_captured("dify", &["version"], None).await?;
    if verify.success {
        output.success(&format!("Dify CLI installed: {}", verify.stdout.trim()));
        Ok(true)
    } else {
        output.error("Dify CLI is still not runnable after installation");
        Ok(false)
    }
}

/// Installs through Homebrew when brew is on the PATH.
/// Returns false when brew is absent.
async fn install_via_brew<R: ProcessRunner>(runner: &R, output: &OutputManager) -> Result<bool> {
    let brew = runner.run_captured("which", &["brew"], None).await?;
    if !brew.success {
        return Ok(false);
    }
    output.plain("Installing via Homebrew...");
    runner.run_checked("brew", &["tap", BREW_TAP], None).await?;
    runner.run_checked("brew", &["install", "dify"], None).await?;
    Ok(true)
}

/// Downloads the prebuilt CLI binary and relocates it onto the PATH.
async fn download_cli(os_token: &str, arch: Arch) -> Result<()> {
    let url = format!("{}/dify-plugin-{}-{}", RELEASE_DOWNLOAD_BASE, os_token, arch);
    log::info!("Downloading {}", url);

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let staging = std::env::temp_dir().join("dify");
    fs::write(&staging, &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).await?;
    }

    // Copy then remove; rename can fail across filesystems.
    fs::copy(&staging, Path::new(CLI_INSTALL_PATH)).await?;
    fs::remove_file(&staging).await?;
    Ok(())
}
