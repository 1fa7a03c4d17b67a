// Standard library
use std::fmt;
use std::path::{Path, PathBuf};

// External crates
use crate::error::{OrcaError, Result};
use duct::cmd;
use tracing::debug;
use which::which;

/// A fully described external process invocation.
///
/// Specs are plain data so that callers can print them, compare them in
/// tests, or hand them to any [`CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
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

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program and arguments joined by single spaces, as a user would type them.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn expression(&self) -> duct::Expression {
        let mut expression = cmd(self.program.as_str(), &self.args);
        if let Some(dir) = &self.dir {
            expression = expression.dir(dir);
        }
        expression.unchecked()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes [`CommandSpec`]s.
///
/// `run` attaches the child to the caller's terminal (interactive shells,
/// followed logs); `capture` collects its output. Both fail with
/// [`OrcaError::Command`] on a non-zero exit.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<()>;
    fn capture(&self, spec: &CommandSpec) -> Result<CapturedOutput>;
}

/// Runs commands on the host through `duct`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCommandRunner;

impl CommandRunner for HostCommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        debug!(command = %spec, dir = ?spec.dir, "running command");
        let output = spec.expression().run()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(OrcaError::Command {
                command: spec.command_line(),
                code: output.status.code(),
                stderr: String::new(),
            })
        }
    }

    fn capture(&self, spec: &CommandSpec) -> Result<CapturedOutput> {
        debug!(command = %spec, dir = ?spec.dir, "capturing command output");
        let output = spec
            .expression()
            .stdout_capture()
            .stderr_capture()
            .run()?;

        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            Ok(captured)
        } else {
            Err(OrcaError::Command {
                command: spec.command_line(),
                code: output.status.code(),
                stderr: captured.stderr,
            })
        }
    }
}

/// Check if a tool is installed and available on PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}

/// Verify that every listed tool resolves on PATH.
pub fn check_tools(tools: &[&str]) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|tool| !is_tool_installed(tool))
        .map(|tool| tool.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(OrcaError::Dependency(missing))
    }
}
