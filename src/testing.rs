//! Shared test doubles.
//!
//! A recording [`ProcessRunner`] and a scripted credential prompt so
//! pipeline stages can be exercised without real subprocesses or a
//! terminal.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{OpsError, Result};
use crate::plugin::debug::{CredentialPrompt, DebugCredentials};
use crate::process::{ExecOutput, Invocation, ProcessRunner};

/// [`ProcessRunner`] double that records invocations and replays canned
/// results keyed by the rendered command line.
///
/// Repeated registrations for the same command line replay in order,
/// with the last one persisting (so a probe can fail before an install
/// and succeed after it). Commands without a canned entry succeed with
/// empty output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    canned: Mutex<HashMap<String, VecDeque<ExecOutput>>>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a successful result with the given stdout for a command line.
    pub fn succeed_with(&self, command: &str, stdout: &str) {
        self.push(
            command,
            ExecOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Registers a failing result for a command line.
    pub fn fail(&self, command: &str, stderr: &str) {
        self.push(
            command,
            ExecOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    fn push(&self, command: &str, output: ExecOutput) {
        self.canned
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(output);
    }

    /// All invocations recorded so far, rendered as command lines.
    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(Invocation::rendered)
            .collect()
    }

    /// All invocations recorded so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> String {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.map(Path::to_path_buf),
        };
        let rendered = invocation.rendered();
        self.calls.lock().unwrap().push(invocation);
        rendered
    }

    fn lookup(&self, rendered: &str) -> ExecOutput {
        let mut canned = self.canned.lock().unwrap();
        match canned.get_mut(rendered) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(default_success),
            None => default_success(),
        }
    }
}

fn default_success() -> ExecOutput {
    ExecOutput {
        success: true,
        code: Some(0),
        stdout: String::new(),
        stderr: String::new(),
    }
}

impl ProcessRunner for FakeRunner {
    async fn run_checked(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let rendered = self.record(program, args, cwd);
        let output = self.lookup(&rendered);
        if output.success {
            Ok(())
        } else {
            Err(OpsError::execution_failed(rendered, output.stderr))
        }
    }

    async fn run_captured(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<ExecOutput> {
        let rendered = self.record(program, args, cwd);
        Ok(self.lookup(&rendered))
    }
}

/// Credential prompt double returning fixed values and counting reads.
#[derive(Debug)]
pub struct FakePrompt {
    credentials: DebugCredentials,
    pub reads: usize,
}

impl FakePrompt {
    pub fn new(api_key: &str, host: &str) -> Self {
        Self {
            credentials: DebugCredentials {
                api_key: api_key.to_string(),
                host: host.to_string(),
            },
            reads: 0,
        }
    }
}

impl CredentialPrompt for FakePrompt {
    fn read_credentials(&mut self) -> std::io::Result<DebugCredentials> {
        self.reads += 1;
        Ok(self.credentials.clone())
    }
}
