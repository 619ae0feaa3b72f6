//! External command execution
//!
//! nixext shells out to `nix`, `git` and `gh`. All of those calls go through
//! [`CommandRunner`] so they can be substituted in tests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors raised while running an external command
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The command could not be started (not installed, not executable)
    #[error("Failed to start process {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("Process {command} exited with code {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Runs a command and captures its standard output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `args`, split with [`split_arguments`]
    async fn run(&self, command: &str, args: &str) -> Result<String, ProcessError>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &str, args: &str) -> Result<String, ProcessError> {
        let argv = split_arguments(args);
        debug!("Running: {} {}", command, argv.join(" "));

        let output = Command::new(command)
            .args(&argv)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: command.to_string(),
                // Killed by a signal
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Split an argument string on spaces, keeping single-quoted regions together
///
/// Quotes are removed; there is no escaping. `eval --expr 'a b'` becomes
/// `["eval", "--expr", "a b"]`.
pub fn split_arguments(arguments: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in arguments.chars() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}
