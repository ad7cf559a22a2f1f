//! Remote-debug sessions for plugins.
//!
//! Collects the debug credentials from the operator, regenerates the
//! plugin's `.env` with the remote connection parameters and launches
//! the plugin entry point as a live, blocking session.

use std::io::{self, BufRead, Write};
use std::path::Path;

pub use crate::config_env::DebugCredentials;

use crate::cli::OutputManager;
use crate::error::Result;
use crate::process::ProcessRunner;

/// Injectable source of remote-debug credentials.
///
/// The terminal implementation blocks on operator input; tests supply a
/// scripted double instead.
pub trait CredentialPrompt {
    /// Reads the API key and host address for a debug session.
    fn read_credentials(&mut self) -> io::Result<DebugCredentials>;
}

/// [`CredentialPrompt`] reading from the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn read_credentials(&mut self) -> io::Result<DebugCredentials> {
        let api_key = read_line("\nEnter the API Key: ")?;
        let host = read_line("Enter the Host Address: ")?;
        Ok(DebugCredentials { api_key, host })
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prints where the operator finds the debug credentials in the console.
pub fn print_credential_instructions(output: &OutputManager) {
    output.plain("\nTo find the plugin debug credentials:");
    output.plain("1. Log in to the Dify console");
    output.plain("2. Click the 'Plugins' icon in the top right corner");
    output.plain("3. Click the debug (bug) icon");
    output.plain("4. Copy the 'API Key' and 'Host Address'");
}

/// Installs the plugin's declared dependencies and launches its entry
/// point in the plugin directory.
///
/// The launch blocks for the lifetime of the debug session; it ends when
/// the operator interrupts it.
pub async fn run_debug_session<R: ProcessRunner>(
    plugin_dir: &Path,
    runner: &R,
    output: &OutputManager,
) -> Result<()> {
    if plugin_dir.join("requirements.txt").exists() {
        output.plain("Installing dependencies...");
        runner
            .run_checked(
                "pip",
                &["install", "-r", "requirements.txt"],
                Some(plugin_dir),
            )
            .await?;
    } else {
        output.warn("No requirements.txt found, skipping dependency install");
    }

    output.plain("Starting plugin...");
    runner
        .run_checked("python", &["-m", "main"], Some(plugin_dir))
        .await
}
