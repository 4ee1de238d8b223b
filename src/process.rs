//! # External Process Execution
//!
//! Everything non-trivial this tool does is delegated to an external
//! program (git, docker compose, psql, gitaggregate). This module provides
//! the single place where those programs are invoked.
//!
//! Commands are built as typed argv token lists ([`CommandLine`]) rather
//! than formatted shell strings, so there is no quoting or injection
//! surface and tests can assert on the exact argv. Execution goes through
//! the [`Runner`] trait; production code uses [`SystemRunner`] while tests
//! substitute a recording implementation.
//!
//! Commands run synchronously to completion. There is no retry, timeout or
//! cancellation here: a non-zero exit is mapped to
//! [`Error::ExternalCommand`] and surfaces to the terminal.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// A fully specified external command: program, argv, environment
/// additions and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The argv as a vector, program first. Used by tests asserting on
    /// literal token lists.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Execution seam for external commands.
pub trait Runner {
    /// Run the command, capturing stdout/stderr. Non-zero exit is an
    /// [`Error::ExternalCommand`].
    fn run_captured(&self, cmd: &CommandLine) -> Result<CapturedOutput>;

    /// Run the command with stdout/stderr inherited from the tool (the
    /// user watches the external program's own output). Non-zero exit is
    /// an [`Error::ExternalCommand`].
    fn run(&self, cmd: &CommandLine) -> Result<()>;

    /// Run the command with stdout redirected to `path` (binary-safe, for
    /// database dumps). Non-zero exit is an [`Error::ExternalCommand`].
    fn run_to_file(&self, cmd: &CommandLine, path: &Path) -> Result<()>;

    /// Run the command with stdin fed from `path` (for database
    /// restores). Non-zero exit is an [`Error::ExternalCommand`].
    fn run_from_file(&self, cmd: &CommandLine, path: &Path) -> Result<()>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(cmd: &CommandLine) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        for (key, value) in &cmd.envs {
            command.env(key, value);
        }
        if let Some(cwd) = &cmd.cwd {
            command.current_dir(cwd);
        }
        command
    }

    fn spawn_error(cmd: &CommandLine, err: std::io::Error) -> Error {
        Error::ExternalCommand {
            command: cmd.to_string(),
            stderr: format!("failed to start: {}", err),
        }
    }
}

impl Runner for SystemRunner {
    fn run_captured(&self, cmd: &CommandLine) -> Result<CapturedOutput> {
        debug!("running (captured): {}", cmd);
        let output = Self::command(cmd)
            .output()
            .map_err(|e| Self::spawn_error(cmd, e))?;
        let captured = CapturedOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if captured.status != 0 {
            return Err(Error::ExternalCommand {
                command: cmd.to_string(),
                stderr: captured.stderr,
            });
        }
        Ok(captured)
    }

    fn run(&self, cmd: &CommandLine) -> Result<()> {
        debug!("running: {}", cmd);
        let status = Self::command(cmd)
            .status()
            .map_err(|e| Self::spawn_error(cmd, e))?;
        if !status.success() {
            return Err(Error::ExternalCommand {
                command: cmd.to_string(),
                stderr: format!("exit status {}", status.code().unwrap_or(-1)),
            });
        }
        Ok(())
    }

    fn run_to_file(&self, cmd: &CommandLine, path: &Path) -> Result<()> {
        debug!("running (stdout -> {}): {}", path.display(), cmd);
        let file = std::fs::File::create(path)?;
        let output = Self::command(cmd)
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Self::spawn_error(cmd, e))?;
        if !output.status.success() {
            return Err(Error::ExternalCommand {
                command: cmd.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    fn run_from_file(&self, cmd: &CommandLine, path: &Path) -> Result<()> {
        debug!("running (stdin <- {}): {}", path.display(), cmd);
        let file = std::fs::File::open(path)?;
        let output = Self::command(cmd)
            .stdin(Stdio::from(file))
            .output()
            .map_err(|e| Self::spawn_error(cmd, e))?;
        if !output.status.success() {
            return Err(Error::ExternalCommand {
                command: cmd.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}
