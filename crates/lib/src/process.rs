//! Child-process execution.
//!
//! Every external tool the pipeline talks to (git, the Go toolchain, the build
//! command) goes through a [`CommandRunner`]. Stages are generic over the
//! runner so tests can script tool output without spawning anything.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from spawning or running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to spawn `{command}`: {source}")]
  Spawn { command: String, source: std::io::Error },

  #[error("command failed ({}): {command}: {stderr}", exit_status(code))]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// An invocation with no program to run.
  #[error("empty command")]
  Empty,
}

fn exit_status(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "terminated by signal".to_string(),
  }
}

/// A fully resolved command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  /// Append stderr to the captured stdout instead of only reporting it on failure.
  pub combine_output: bool,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      combine_output: false,
    }
  }

  /// Build an invocation from an argument vector whose first element is the program.
  pub fn from_argv(argv: Vec<String>) -> Result<Self, ProcessError> {
    let mut argv = argv.into_iter();
    let program = argv.next().ok_or(ProcessError::Empty)?;
    Ok(Self::new(program).args(argv))
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

  /// Run in `dir`. `None` keeps the caller's current directory.
  pub fn current_dir(mut self, dir: Option<&Path>) -> Self {
    self.cwd = dir.map(Path::to_path_buf);
    self
  }

  pub fn combine_output(mut self, combine: bool) -> Self {
    self.combine_output = combine;
    self
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Runs external commands to completion and returns their captured output.
pub trait CommandRunner: Send + Sync {
  fn output(&self, invocation: &Invocation) -> impl Future<Output = Result<Vec<u8>, ProcessError>> + Send;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  async fn output(&self, invocation: &Invocation) -> Result<Vec<u8>, ProcessError> {
    let mut command = Command::new(&invocation.program);
    command
      .args(&invocation.args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    if let Some(dir) = &invocation.cwd {
      command.current_dir(dir);
    }

    debug!(command = %invocation, cwd = ?invocation.cwd, "spawning process");

    let output = command.output().await.map_err(|source| ProcessError::Spawn {
      command: invocation.to_string(),
      source,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      if !output.stdout.is_empty() {
        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "command stdout");
      }
      return Err(ProcessError::Failed {
        command: invocation.to_string(),
        code: output.status.code(),
        stderr,
      });
    }

    let mut captured = output.stdout;
    if invocation.combine_output {
      captured.extend_from_slice(&output.stderr);
    }
    Ok(captured)
  }
}

/// Split tool output into non-empty, trimmed lines.
pub fn output_lines(output: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(output)
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}
