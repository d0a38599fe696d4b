//! Configuration bundle for a pipeline run.
//!
//! Values are resolved once, before any stage runs, and never change during
//! the run. Validation is left to the stage that consumes each value so a bad
//! value fails before that stage's side effects and not earlier.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Token in the build command that is replaced by each target's local path.
pub const ENTRYPOINT_PLACEHOLDER: &str = "{{entrypoint}}";

pub const DEFAULT_CMD_PREFIX: &str = "./cmd/";

pub const DEFAULT_BUILD_COMMAND: &str = "go build -o ./bin/ {{entrypoint}}";

/// CI systems export the previous and new revisions under different names.
/// The first variable with content wins.
pub const GIT_RANGE_START_ENVVARS: &[&str] = &["ARTIFACT_GIT_RANGE_START", "GIT_PREVIOUS_COMMIT"];

pub const GIT_RANGE_END_ENVVARS: &[&str] = &["ARTIFACT_GIT_RANGE_END", "GIT_COMMIT"];

/// Supported renderings of the target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  Txt,
  Json,
}

impl OutputFormat {
  pub const ALL: [OutputFormat; 2] = [OutputFormat::Txt, OutputFormat::Json];

  /// Parse a format name; names are case-sensitive.
  pub fn parse(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|format| format.as_str() == name)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OutputFormat::Txt => "txt",
      OutputFormat::Json => "json",
    }
  }

  /// Whether a run in this format goes on to build when not told otherwise.
  ///
  /// JSON output is treated as a terminal report.
  pub fn builds_by_default(self) -> bool {
    matches!(self, OutputFormat::Txt)
  }
}

impl fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Everything a pipeline run needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
  /// Compute and log build commands without running them.
  pub dry_run: bool,
  /// Directory every external command runs in. `None` means the current directory.
  pub working_directory: Option<PathBuf>,
  pub git_range_start: String,
  pub git_range_end: String,
  /// Directory (relative to the working directory) that holds the entrypoints.
  pub cmd_prefix: String,
  /// Treat the prefix itself as the only entrypoint instead of each subdirectory.
  pub skip_nested_entrypoints: bool,
  /// Import path prefix that marks a dependency as first-party.
  pub repo_basename: String,
  /// Raw format name; the reporting stage rejects unknown names.
  pub out_format: String,
  pub build_command: String,
  /// Populate the rebuild set after reporting. `None` derives it from the format.
  pub build_after_report: Option<bool>,
  /// Upper bound on concurrent dependency queries.
  pub jobs: usize,
  /// Write each target's captured build output under this directory.
  pub log_dir: Option<PathBuf>,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      dry_run: true,
      working_directory: None,
      git_range_start: String::new(),
      git_range_end: String::new(),
      cmd_prefix: DEFAULT_CMD_PREFIX.to_string(),
      skip_nested_entrypoints: true,
      repo_basename: String::new(),
      out_format: OutputFormat::Txt.as_str().to_string(),
      build_command: DEFAULT_BUILD_COMMAND.to_string(),
      build_after_report: None,
      jobs: default_jobs(),
      log_dir: None,
    }
  }
}

impl BuildConfig {
  /// Whether the reporting stage hands its targets on to the build stage.
  pub fn builds_after_report(&self) -> bool {
    self.build_after_report.unwrap_or_else(|| {
      OutputFormat::parse(&self.out_format)
        .map(OutputFormat::builds_by_default)
        .unwrap_or(false)
    })
  }

  /// Fill empty git range endpoints from the CI environment.
  pub fn with_git_range_from_env(mut self) -> Self {
    self.git_range_start = resolve_from_env(&self.git_range_start, GIT_RANGE_START_ENVVARS);
    self.git_range_end = resolve_from_env(&self.git_range_end, GIT_RANGE_END_ENVVARS);
    self
  }
}

/// Return `explicit` if it has content, else the first listed environment
/// variable with content, else the empty string.
///
/// A variable that is set but empty is skipped.
pub fn resolve_from_env(explicit: &str, names: &[&str]) -> String {
  if !explicit.is_empty() {
    return explicit.to_string();
  }
  find_value_from_env(names).unwrap_or_default()
}

fn find_value_from_env(names: &[&str]) -> Option<String> {
  names
    .iter()
    .filter_map(|name| std::env::var(name).ok())
    .find(|value| !value.is_empty())
}

fn default_jobs() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
