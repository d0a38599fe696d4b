//! Build execution: run the build command once per rebuild target.
//!
//! The command template is split into arguments with shell-style quoting and
//! `{{entrypoint}}` is substituted inside each argument, so a target path is
//! never re-split. No shell is involved.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ENTRYPOINT_PLACEHOLDER;
use crate::error::PipelineError;
use crate::logs::write_build_log;
use crate::process::{CommandRunner, Invocation};
use crate::stage::Stage;
use crate::state::{BuildLogs, PipelineState};
use crate::util::path::local_path;

pub struct RebuildStage<R> {
  pub build_command: String,
  pub dry_run: bool,
  pub working_directory: Option<PathBuf>,
  /// Directory to persist each target's build output in.
  pub log_dir: Option<PathBuf>,
  runner: Arc<R>,
}

impl<R: CommandRunner> RebuildStage<R> {
  pub fn new(build_command: impl Into<String>, dry_run: bool, working_directory: Option<PathBuf>, runner: Arc<R>) -> Self {
    Self {
      build_command: build_command.into(),
      dry_run,
      working_directory,
      log_dir: None,
      runner,
    }
  }

  pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
    self.log_dir = log_dir;
    self
  }

  fn template_args(&self) -> Result<Vec<String>, PipelineError> {
    shell_words::split(&self.build_command).map_err(|e| PipelineError::InvalidBuildCommand {
      command: self.build_command.clone(),
      message: e.to_string(),
    })
  }

  /// The build command for `target`, as it would be typed.
  pub fn resolve_command(&self, target: &str) -> String {
    self.build_command.replace(ENTRYPOINT_PLACEHOLDER, &local_path(target))
  }

  /// The argument vector for `target`.
  pub fn resolve_args(&self, target: &str) -> Result<Vec<String>, PipelineError> {
    let local = local_path(target);
    Ok(
      self
        .template_args()?
        .into_iter()
        .map(|arg| arg.replace(ENTRYPOINT_PLACEHOLDER, &local))
        .collect(),
    )
  }
}

impl<R: CommandRunner> Stage for RebuildStage<R> {
  fn name(&self) -> &'static str {
    "rebuild"
  }

  fn precheck(&self, _state: &PipelineState) -> Result<(), PipelineError> {
    if self.build_command.trim().is_empty() {
      return Err(PipelineError::MissingBuildCommand);
    }
    if !self.build_command.contains(ENTRYPOINT_PLACEHOLDER) {
      return Err(PipelineError::BuildCommandMissingPlaceholder {
        placeholder: ENTRYPOINT_PLACEHOLDER,
      });
    }
    self.template_args().map(|_| ())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    let targets = state.rebuild_targets()?.to_vec();
    if self.dry_run {
      warn!("dry run, build commands will be logged but not executed");
    }

    let mut logs = BuildLogs::new();
    for target in &targets {
      info!(entrypoint = %target, command = %self.resolve_command(target), "rebuilding target");
      if self.dry_run {
        continue;
      }

      let invocation = Invocation::from_argv(self.resolve_args(target)?)?
        .current_dir(self.working_directory.as_deref())
        .combine_output(true);
      let output = self.runner.output(&invocation).await?;

      if let Some(dir) = &self.log_dir {
        let path = write_build_log(dir, target, &output)?;
        info!(entrypoint = %target, path = %path.display(), "wrote build log");
      }
      logs.insert(target.clone(), output);
    }

    Ok(state.with_build_logs(logs))
  }
}
