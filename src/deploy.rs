//! Platform lifecycle pipelines.
//!
//! Linear, idempotent stage sequences over the probing, installation,
//! acquisition, configuration and service-control components. A failed
//! required stage aborts the remainder; nothing is rolled back.

use std::path::Path;

use crate::acquire::{self, DOCKER_SUBDIR};
use crate::cli::OutputManager;
use crate::compose::ComposeController;
use crate::config_env;
use crate::error::Result;
use crate::install;
use crate::probe::{self, EnvironmentProfile};
use crate::process::ProcessRunner;

/// Provisions and starts a Dify deployment under `install_dir`.
///
/// The environment profile is constructed once by the caller and passed
/// through; the requirement gates must fire before any installer call.
pub async fn deploy<R: ProcessRunner>(
    install_dir: &Path,
    profile: &EnvironmentProfile,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    output.banner("Dify deployment");

    output.step(1, "Checking system requirements");
    probe::check_deploy_requirements(profile, output)?;

    install::ensure_docker(profile, runner, output).await?;

    output.step(3, "Fetching Dify source");
    let dify_dir = acquire::clone_platform_source(install_dir, runner, output).await?;

    output.step(4, "Configuring environment variables");
    let docker_dir = dify_dir.join(DOCKER_SUBDIR);
    config_env::materialize_env(&docker_dir, output).await?;

    output.step(5, "Starting Dify services");
    let controller = ComposeController::new(&docker_dir);
    output.plain("Pulling Docker images...");
    controller.pull(runner).await?;
    output.plain("Starting services...");
    controller.up(runner).await?;
    output.success("Dify services started");

    output.step(6, "Checking service status");
    controller.ps(runner, output).await?;
    output.success("Service status check complete");

    print_access_info(output);
    Ok(())
}

/// Stops the services of an existing deployment.
pub async fn stop<R: ProcessRunner>(
    dify_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    let controller = ComposeController::new(dify_dir.join(DOCKER_SUBDIR));
    controller.down(runner).await?;
    output.success("Dify services stopped");
    Ok(())
}

/// Restarts the services of an existing deployment.
pub async fn restart<R: ProcessRunner>(
    dify_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    let controller = ComposeController::new(dify_dir.join(DOCKER_SUBDIR));
    controller.restart(runner).await?;
    output.success("Dify services restarted");
    Ok(())
}

/// Upgrades a deployment: latest manifests, then images, then recreate.
///
/// Strictly ordered; pulling images against a stale manifest revision
/// would fetch the wrong containers, so each step gates the next.
pub async fn upgrade<R: ProcessRunner>(
    dify_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    output.step(1, "Updating source");
    runner.run_checked("git", &["pull"], Some(dify_dir)).await?;

    let controller = ComposeController::new(dify_dir.join(DOCKER_SUBDIR));
    output.step(2, "Updating images");
    controller.pull(runner).await?;

    output.step(3, "Recreating services");
    controller.up(runner).await?;

    output.success("Dify upgrade complete");
    Ok(())
}

fn print_access_info(output: &OutputManager) {
    output.step(7, "Access information");
    output.banner("Dify deployed successfully!");
    output.plain("\nAccess Dify at:");
    output.plain("  local:  http://localhost/install");
    output.plain("  remote: http://<server-ip>/install");
    output.plain("\nThe first visit sets up the admin account.");
    output.plain("\nCommon commands:");
    output.plain("  stop:    dify-ops stop --dir <dify-dir>");
    output.plain("  restart: dify-ops restart --dir <dify-dir>");
    output.plain("  logs:    cd <dify-dir>/docker && docker compose logs -f");
    output.plain("  upgrade: dify-ops upgrade --dir <dify-dir>");
    output.plain(&"=".repeat(50));
}
