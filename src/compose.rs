//! Service control through `docker compose`.
//!
//! Wraps the orchestration subcommands against the manifest
//! subdirectory. Required steps (pull, up, down, restart) are fatal on
//! failure; the status listing is informational and its raw output is
//! surfaced as-is.

use std::path::{Path, PathBuf};

use crate::cli::OutputManager;
use crate::error::Result;
use crate::process::ProcessRunner;

/// Controller for a compose deployment rooted at the manifest subdirectory.
#[derive(Debug, Clone)]
pub struct ComposeController {
    docker_dir: PathBuf,
}

impl ComposeController {
    /// Creates a controller for the given manifest subdirectory.
    pub fn new(docker_dir: impl Into<PathBuf>) -> Self {
        Self {
            docker_dir: docker_dir.into(),
        }
    }

    /// The manifest subdirectory this controller operates in.
    pub fn docker_dir(&self) -> &Path {
        &self.docker_dir
    }

    async fn compose<R: ProcessRunner>(&self, runner: &R, args: &[&str]) -> Result<()> {
        let mut full: Vec<&str> = vec!["compose"];
        full.extend_from_slice(args);
        runner
            .run_checked("docker", &full, Some(&self.docker_dir))
            .await
    }

    /// Pulls the service images. Required step.
    pub async fn pull<R: ProcessRunner>(&self, runner: &R) -> Result<()> {
        self.compose(runner, &["pull"]).await
    }

    /// Starts the services detached. Required step.
    pub async fn up<R: ProcessRunner>(&self, runner: &R) -> Result<()> {
        self.compose(runner, &["up", "-d"]).await
    }

    /// Stops and removes the services. Required step.
    pub async fn down<R: ProcessRunner>(&self, runner: &R) -> Result<()> {
        self.compose(runner, &["down"]).await
    }

    /// Restarts the services. Required step.
    pub async fn restart<R: ProcessRunner>(&self, runner: &R) -> Result<()> {
        self.compose(runner, &["restart"]).await
    }

    /// Reports the service status.
    ///
    /// Informational: the raw listing is surfaced and a non-zero exit is
    /// tolerated rather than aborting the pipeline.
    pub async fn ps<R: ProcessRunner>(&self, runner: &R, output: &OutputManager) -> Result<()> {
        let result = runner
            .run_captured("docker", &["compose", "ps"], Some(&self.docker_dir))
            .await?;
        if !result.stdout.is_empty() {
            output.plain(&result.stdout);
        }
        if !result.success {
            output.warn("docker compose ps exited non-zero");
            if !result.stderr.is_empty() {
                output.plain(result.stderr.trim());
            }
        }
        Ok(())
    }
}
