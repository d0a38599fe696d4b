//! Changeset identification: which files differ between two revisions.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::PipelineError;
use crate::process::{CommandRunner, Invocation, output_lines};
use crate::stage::Stage;
use crate::state::PipelineState;

pub struct ChangesetStage<R> {
  pub git_range_start: String,
  pub git_range_end: String,
  pub working_directory: Option<PathBuf>,
  runner: Arc<R>,
}

impl<R: CommandRunner> ChangesetStage<R> {
  pub fn new(
    git_range_start: impl Into<String>,
    git_range_end: impl Into<String>,
    working_directory: Option<PathBuf>,
    runner: Arc<R>,
  ) -> Self {
    Self {
      git_range_start: git_range_start.into(),
      git_range_end: git_range_end.into(),
      working_directory,
      runner,
    }
  }

  /// `git diff-tree --no-commit-id --name-only -r <end>..<start>`
  pub fn invocation(&self) -> Invocation {
    Invocation::new("git")
      .args(["diff-tree", "--no-commit-id", "--name-only", "-r"])
      .arg(format!("{}..{}", self.git_range_end, self.git_range_start))
      .current_dir(self.working_directory.as_deref())
  }
}

impl<R: CommandRunner> Stage for ChangesetStage<R> {
  fn name(&self) -> &'static str {
    "changeset"
  }

  fn precheck(&self, _state: &PipelineState) -> Result<(), PipelineError> {
    if self.git_range_start.is_empty() || self.git_range_end.is_empty() {
      return Err(PipelineError::InvalidGitRange);
    }
    Ok(())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    let invocation = self.invocation();
    info!(command = %invocation, "identifying changes");

    let output = self.runner.output(&invocation).await?;
    let changes = output_lines(&output);

    info!(count = changes.len(), changes = ?changes, "identified changes");
    Ok(state.with_changes(changes))
  }
}
