//! External process execution.
//!
//! Every external tool the pipelines touch (docker, git, the dify CLI,
//! apt/yum, pip, python) goes through the [`ProcessRunner`] capability so
//! tests can substitute a fake without spawning real subprocesses.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{OpsError, Result};

/// Captured result of a probing or informational command.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Whether the command exited successfully
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Narrow capability over subprocess execution.
///
/// `run_checked` is for required steps: stdio is inherited so the
/// operator sees tool output live, and a non-zero exit is a fatal
/// [`CliError::ExecutionFailed`](crate::error::CliError::ExecutionFailed).
/// `run_captured` is for probes and informational steps: output is
/// captured and a non-zero exit is reported in the result, never as an
/// error.
pub trait ProcessRunner {
    /// Runs a required command, inheriting stdio. Non-zero exit is fatal.
    fn run_checked(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> impl Future<Output = Result<()>>;

    /// Runs a command with captured output. Never fails on non-zero exit.
    fn run_captured(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> impl Future<Output = Result<ExecOutput>>;
}

/// [`ProcessRunner`] backed by real subprocesses via tokio.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(program: &str, args: &[&str], cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Renders a command line for diagnostics.
pub fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

impl ProcessRunner for SystemRunner {
    async fn run_checked(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let rendered = display_command(program, args);
        log::debug!("run_checked: {}", rendered);

        let status = Self::command(program, args, cwd)
            .status()
            .await
            .map_err(|e| OpsError::execution_failed(rendered.clone(), e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(OpsError::execution_failed(
                rendered,
                format!("exit code {}", status.code().unwrap_or(-1)),
            ))
        }
    }

    async fn run_captured(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<ExecOutput> {
        let rendered = display_command(program, args);
        log::debug!("run_captured: {}", rendered);

        let output = Self::command(program, args, cwd)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => Ok(ExecOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            // Spawn failure (command not found) is a probe miss, not a
            // fatal error: probes exist to answer "is the tool there?".
            Err(e) => {
                log::debug!("spawn failed for {}: {}", rendered, e);
                Ok(ExecOutput {
                    success: false,
                    code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

/// A recorded subprocess invocation, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Working directory, when one was set
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Renders the invocation as `program arg1 arg2 ...`.
    pub fn rendered(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        display_command(&self.program, &args)
    }
}
