// crates/publish-flow-providers/src/shell.rs
// ============================================================================
// Module: Shell Command Runner
// Description: CommandRunner backed by child processes.
// Purpose: Run git and hook tooling with captured, logged output.
// Dependencies: publish-flow-core, tracing
// ============================================================================

//! ## Overview
//! Arguments are passed directly to the program without a shell, so branch
//! names and commit messages never need quoting. Every command is logged at
//! `info`; captured output is logged at `debug` whether or not it succeeded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Command;

use publish_flow_core::CommandError;
use publish_flow_core::CommandOutput;
use publish_flow_core::CommandRunner;
use tracing::debug;
use tracing::info;

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner {
    /// Working directory; the current directory when unset.
    working_dir: Option<PathBuf>,
}

impl ShellCommandRunner {
    /// Creates a runner in the current directory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            working_dir: None,
        }
    }

    /// Creates a runner rooted at `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let (program, rest) = args.split_first().ok_or(CommandError::Empty)?;
        let rendered = args.join(" ");
        info!(command = %rendered, "running command");

        let mut command = Command::new(program);
        command.args(rest);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let output = command.output().map_err(|err| CommandError::Spawn {
            command: rendered.clone(),
            message: err.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!(command = %rendered, %stdout, %stderr, "command output");

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: rendered,
                status: output.status.code(),
                stdout,
                stderr,
            });
        }
        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }
}
