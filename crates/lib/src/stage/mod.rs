//! Pipeline stages.
//!
//! A stage checks its preconditions against the state produced so far, then
//! consumes that state and returns it with its own contribution added:
//!
//! 1. [`ChangesetStage`] - files changed in the git range
//! 2. [`EntrypointStage`] - buildable units under the prefix
//! 3. [`DependencyStage`] - first-party dependencies of each entrypoint
//! 4. [`ImpactStage`] - entrypoints whose dependencies changed
//! 5. [`ReportStage`] - render the targets and pick the rebuild set
//! 6. [`RebuildStage`] - run the build command per target

pub mod changeset;
pub mod dependencies;
pub mod entrypoints;
pub mod impact;
pub mod rebuild;
pub mod report;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::state::PipelineState;

pub use changeset::ChangesetStage;
pub use dependencies::DependencyStage;
pub use entrypoints::EntrypointStage;
pub use impact::ImpactStage;
pub use rebuild::RebuildStage;
pub use report::ReportStage;

/// One step of the pipeline.
#[allow(async_fn_in_trait)]
pub trait Stage {
  /// Short name used in logs.
  fn name(&self) -> &'static str;

  /// Validate configuration and required state before any side effect.
  fn precheck(&self, state: &PipelineState) -> Result<(), PipelineError>;

  /// Do the work, returning the state with this stage's output added.
  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError>;
}

/// Precheck then run a single stage, logging its boundaries.
pub async fn run_stage<S: Stage>(stage: &S, state: PipelineState) -> Result<PipelineState, PipelineError> {
  debug!(stage = stage.name(), "checking preconditions");
  stage.precheck(&state)?;

  info!(stage = stage.name(), "running stage");
  let state = stage.run(state).await?;
  debug!(stage = stage.name(), "stage complete");

  Ok(state)
}
