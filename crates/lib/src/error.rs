//! Errors raised while deciding and running rebuilds.
//!
//! Every failure is categorical and fatal: the pipeline never retries and never
//! substitutes a default for missing data.

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessError;
use crate::state::StateKey;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  // === Configuration ===
  /// Either end of the git range is empty.
  #[error("invalid git range")]
  InvalidGitRange,

  /// The output format is not one of the supported formats.
  #[error("invalid output format: {0}")]
  InvalidOutputFormat(String),

  #[error("must provide build command")]
  MissingBuildCommand,

  #[error("must provide build command that uses {placeholder}")]
  BuildCommandMissingPlaceholder { placeholder: &'static str },

  /// The build command could not be split into arguments (e.g. unbalanced quotes).
  #[error("invalid build command {command:?}: {message}")]
  InvalidBuildCommand { command: String, message: String },

  #[error("entrypoint prefix does not exist: {}", path.display())]
  PrefixNotFound { path: PathBuf },

  #[error("provided prefix must point to a directory: {}", path.display())]
  PrefixNotDirectory { path: PathBuf },

  // === State ===
  /// A stage needed a state slot that no earlier stage produced.
  #[error("pipeline state is missing `{0}`")]
  MissingState(StateKey),

  #[error("no valid changes were identified")]
  ChangesNotIdentified,

  #[error("no valid dependencies were identified")]
  DependenciesNotIdentified,

  // === Empty results ===
  #[error("no changes were found")]
  NoChangesFound,

  /// No entrypoint has a dependency under the repository basename.
  #[error("no first-party dependencies were found")]
  NoDependenciesFound,

  #[error("no targets need to be rebuilt")]
  NoTargetsToRebuild,

  #[error("no valid rebuild targets determined")]
  NoRebuildTargets,

  // === External ===
  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error("worker task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("failed to render targets: {0}")]
  Render(#[from] serde_json::Error),

  #[error("io error at {}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },
}

impl PipelineError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    PipelineError::Io {
      path: path.into(),
      source,
    }
  }
}
