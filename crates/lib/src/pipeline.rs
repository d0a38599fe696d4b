//! The pipeline driver.
//!
//! Runs the stages strictly in order, threading the state from one to the
//! next. The first failing precheck or stage ends the run with that stage's
//! error. A run succeeds only if the final state holds a rebuild set.

use std::sync::Arc;

use tracing::info;

use crate::config::BuildConfig;
use crate::error::PipelineError;
use crate::process::{CommandRunner, SystemRunner};
use crate::stage::{
  ChangesetStage, DependencyStage, EntrypointStage, ImpactStage, RebuildStage, ReportStage, run_stage,
};
use crate::state::PipelineState;

pub struct Pipeline<R = SystemRunner> {
  config: BuildConfig,
  runner: Arc<R>,
}

impl Pipeline<SystemRunner> {
  /// A pipeline that runs real git, go and build processes.
  pub fn from_config(config: BuildConfig) -> Self {
    Self::new(config, SystemRunner)
  }
}

impl<R: CommandRunner + 'static> Pipeline<R> {
  pub fn new(config: BuildConfig, runner: R) -> Self {
    Self {
      config,
      runner: Arc::new(runner),
    }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  /// Run every stage and return the targets that were rebuilt (or would be, in a dry run).
  pub async fn run(&self) -> Result<Vec<String>, PipelineError> {
    self.run_with_state().await?.into_rebuild_targets()
  }

  /// Run every stage and return the final state, including build logs.
  ///
  /// Fails with [`PipelineError::NoRebuildTargets`] when no rebuild set was produced.
  pub async fn run_with_state(&self) -> Result<PipelineState, PipelineError> {
    let config = &self.config;
    if let Some(dir) = &config.working_directory {
      info!(dir = %dir.display(), "working in a different directory");
    }

    let wd = config.working_directory.clone();
    let state = PipelineState::new();

    let state = run_stage(
      &ChangesetStage::new(
        &config.git_range_start,
        &config.git_range_end,
        wd.clone(),
        self.runner.clone(),
      ),
      state,
    )
    .await?;

    let state = run_stage(
      &EntrypointStage::new(&config.cmd_prefix, config.skip_nested_entrypoints, wd.clone()),
      state,
    )
    .await?;

    let state = run_stage(
      &DependencyStage::new(&config.repo_basename, wd.clone(), config.jobs, self.runner.clone()),
      state,
    )
    .await?;

    let state = run_stage(&ImpactStage, state).await?;

    let state = run_stage(
      &ReportStage::new(&config.out_format, config.builds_after_report()),
      state,
    )
    .await?;

    let state = run_stage(
      &RebuildStage::new(&config.build_command, config.dry_run, wd, self.runner.clone())
        .with_log_dir(config.log_dir.clone()),
      state,
    )
    .await?;

    state.rebuild_targets()?;
    Ok(state)
  }
}
