//! # Command execution
//!
//! Runs model-suggested commands through a shell and captures what they
//! print. Command text comes from the model, which the user's text steers:
//! there is no sandbox and no allow-list here. Gating happens before this
//! point, through [`crate::ExecutionPolicy`] and a [`crate::Confirmer`].

use crate::error;
use std::process::Stdio;
use tracing::{info, warn};

/// Shell exit status for "command not found"
const EXIT_NOT_FOUND: i32 = 127;

/// What a finished command left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_failed: bool,
    pub exit_code: Option<i32>,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(stderr: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_failed: true,
            exit_code,
            ..Default::default()
        }
    }

    /// Result for a program that could not be found
    pub fn not_found(program: &str) -> Self {
        let err = error::command_not_found(program);
        Self::failure(err.message(), Some(EXIT_NOT_FOUND))
    }

    /// Anything at all on stdout, a bare newline included
    pub fn has_output(&self) -> bool {
        !self.stdout.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// Nothing on either stream
    pub fn is_silent(&self) -> bool {
        !self.has_output() && !self.has_error()
    }
}

/// Runs a command to completion. The call does not return until the
/// process has exited.
#[allow(async_fn_in_trait)]
pub trait Executor: Send + Sync {
    async fn execute(&self, command: &str) -> ExecutionResult;
}

/// Executes through `<shell> -c <command>`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    max_output_chars: usize,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh", 20_000)
    }
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>, max_output_chars: usize) -> Self {
        Self {
            shell: shell.into(),
            max_output_chars,
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Executor for ShellExecutor {
    async fn execute(&self, command: &str) -> ExecutionResult {
        info!(shell = %self.shell, command, "executing command");

        let output = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(shell = %self.shell, "shell not found");
                return ExecutionResult::not_found(&self.shell);
            }
            Err(e) => {
                let err = error::spawn_failed(&self.shell, e.to_string());
                warn!("{}", err);
                return ExecutionResult::failure(err.message().to_string(), None);
            }
        };

        let stdout =
            truncate_output(&String::from_utf8_lossy(&output.stdout), self.max_output_chars);
        let mut stderr =
            truncate_output(&String::from_utf8_lossy(&output.stderr), self.max_output_chars);
        let exit_code = output.status.code();
        let exit_failed = !output.status.success();

        if exit_code == Some(EXIT_NOT_FOUND) {
            let program = command.split_whitespace().next().unwrap_or(command);
            let err = error::command_not_found(program);
            warn!("{}", err);
            stderr = if stderr.trim().is_empty() {
                err.message().to_string()
            } else {
                format!("{}\n{}", err.message(), stderr)
            };
        } else if exit_failed && stderr.trim().is_empty() {
            stderr = match exit_code {
                Some(code) => format!("Command exited with status {}", code),
                None => "Command was terminated by a signal".to_string(),
            };
        }

        info!(?exit_code, stdout_len = stdout.len(), stderr_len = stderr.len(), "command finished");

        ExecutionResult {
            stdout,
            stderr,
            exit_failed,
            exit_code,
        }
    }
}

/// Keep the head and tail of long output so the model sees both ends
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    let total = output.chars().count();
    if total <= max_chars {
        return output.to_string();
    }

    let half = max_chars / 2;
    let head: String = output.chars().take(half).collect();
    let tail: String = output.chars().skip(total - half).collect();
    format!("{}\n\n... [truncated {} chars] ...\n\n{}", head, total - 2 * half, tail)
}
