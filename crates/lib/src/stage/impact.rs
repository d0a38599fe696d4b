//! Impact computation: which entrypoints depend on a changed location.
//!
//! Changed files are coarsened to their containing directory and compared by
//! exact string equality against each entrypoint's first-party dependency
//! paths. One hit is enough to mark an entrypoint for rebuild.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::stage::Stage;
use crate::state::{DependencyMap, PipelineState};
use crate::util::path::location;

/// The set of directories containing at least one changed file.
pub fn changed_locations(changes: &[String]) -> HashSet<String> {
  changes.iter().map(|change| location(change)).collect()
}

/// Entrypoints with at least one dependency at a changed location, in map order.
pub fn affected_entrypoints(changes: &[String], dependencies: &DependencyMap) -> Vec<String> {
  let locations = changed_locations(changes);

  dependencies
    .iter()
    .filter(|(entrypoint, deps)| {
      debug!(entrypoint = %entrypoint, "checking dependencies");
      match deps.iter().find(|dep| locations.contains(dep.as_str())) {
        Some(dep) => {
          debug!(entrypoint = %entrypoint, dependency = %dep, "identified matching change");
          true
        }
        None => false,
      }
    })
    .map(|(entrypoint, _)| entrypoint.clone())
    .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactStage;

impl Stage for ImpactStage {
  fn name(&self) -> &'static str {
    "impact"
  }

  fn precheck(&self, state: &PipelineState) -> Result<(), PipelineError> {
    state.changes().map_err(|_| PipelineError::ChangesNotIdentified)?;
    state
      .dependencies()
      .map_err(|_| PipelineError::DependenciesNotIdentified)?;
    Ok(())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    let changes = state.changes().map_err(|_| PipelineError::ChangesNotIdentified)?;
    let dependencies = state
      .dependencies()
      .map_err(|_| PipelineError::DependenciesNotIdentified)?;

    let targets = affected_entrypoints(changes, dependencies);

    let total = targets.len();
    info!(count = total, "identified targets to be rebuilt");
    if targets.is_empty() {
      return Err(PipelineError::NoTargetsToRebuild);
    }
    for (i, target) in targets.iter().enumerate() {
      info!("[{}/{}] target to be rebuilt: {}", i + 1, total, target);
    }

    Ok(state.with_targets(targets))
  }
}
