//! External process execution.
//!
//! Every tool bindforge drives (git, cmake, ninja, ldconfig, binder) is an
//! opaque external process judged solely by its exit status and the files it
//! produces. This module is the single place commands are spawned.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Captured result of an external command that completed successfully.
#[derive(Debug)]
pub struct CommandOutput {
    /// Exit code (always zero for a returned value; kept for symmetry).
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

/// Runs external commands on behalf of the installers and the generation
/// pipeline.
///
/// Invocations are blocking; a non-zero exit status becomes
/// [`Error::ExternalTool`] carrying the exact command line. Environment
/// overrides apply to every spawned process, which also gives tests a seam
/// to point `PATH` at stub executables.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    env_overrides: Vec<(String, String)>,
}

impl ProcessRunner {
    /// Create a runner that spawns processes with the inherited environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable set on every spawned process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.push((key.into(), value.into()));
        self
    }

    /// Run a command with inherited stdio, failing on a non-zero exit.
    pub fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<()> {
        let mut command = self.command(argv, cwd)?;
        let rendered = render(argv);
        tracing::info!("running command: {}", rendered);

        let status = command.status().map_err(|e| Error::ExternalTool {
            command: format!("{} ({})", rendered, e),
            code: None,
        })?;

        if !status.success() {
            return Err(Error::ExternalTool {
                command: rendered,
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Run a command capturing stdout/stderr, failing on a non-zero exit.
    pub fn output(&self, argv: &[String], cwd: Option<&Path>) -> Result<CommandOutput> {
        let mut command = self.command(argv, cwd)?;
        let rendered = render(argv);
        tracing::debug!("running command: {}", rendered);

        let output = command.output().map_err(|e| Error::ExternalTool {
            command: format!("{} ({})", rendered, e),
            code: None,
        })?;

        if !output.status.success() {
            return Err(Error::ExternalTool {
                command: rendered,
                code: output.status.code(),
            });
        }

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn command(&self, argv: &[String], cwd: Option<&Path>) -> Result<Command> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            Error::Validation("cannot run an empty command line".to_string())
        })?;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        for (key, value) in &self.env_overrides {
            command.env(key, value);
        }
        Ok(command)
    }
}

fn render(argv: &[String]) -> String {
    argv.join(" ")
}

/// Split a whitespace-delimited command line into argv form.
///
/// Convenient for assembling fixed tool invocations; arguments that may
/// contain spaces must be pushed individually instead.
pub fn argv(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let runner = ProcessRunner::new();
        let err = runner.run(&[], None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn argv_splits_on_whitespace() {
        assert_eq!(argv("git clone  --depth 1"), vec!["git", "clone", "--depth", "1"]);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_reports_command_and_code() {
        let runner = ProcessRunner::new();
        let err = runner.run(&argv("false"), None).unwrap_err();
        match err {
            Error::ExternalTool { command, code } => {
                assert_eq!(command, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn output_captures_stdout() {
        let runner = ProcessRunner::new();
        let out = runner.output(&argv("echo hello"), None).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn env_overrides_reach_the_child() {
        let runner = ProcessRunner::new().env("BINDFORGE_TEST_MARKER", "42");
        let out = runner.output(&argv("printenv BINDFORGE_TEST_MARKER"), None).unwrap();
        assert_eq!(out.stdout.trim(), "42");
    }
}
