//! Pipeline state threaded from stage to stage.
//!
//! Each slot is produced by exactly one stage and read by later ones. A stage
//! that reads a slot nobody produced fails with [`PipelineError::MissingState`]
//! instead of falling back to an empty value.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::PipelineError;

/// Names of the state slots, displayed the way logs and errors refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
  Changes,
  Entrypoints,
  Dependencies,
  Targets,
  RebuildTargets,
  BuildLogs,
}

impl StateKey {
  pub fn as_str(self) -> &'static str {
    match self {
      StateKey::Changes => "changes",
      StateKey::Entrypoints => "entrypoints",
      StateKey::Dependencies => "dependencies",
      StateKey::Targets => "targets",
      StateKey::RebuildTargets => "rebuild targets",
      StateKey::BuildLogs => "build logs",
    }
  }
}

impl fmt::Display for StateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Entrypoint path -> first-party dependency paths, in the order the toolchain reported them.
pub type DependencyMap = BTreeMap<String, Vec<String>>;

/// Entrypoint path -> raw captured build output.
pub type BuildLogs = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineState {
  changes: Option<Vec<String>>,
  entrypoints: Option<Vec<String>>,
  dependencies: Option<DependencyMap>,
  targets: Option<Vec<String>>,
  rebuild_targets: Option<Vec<String>>,
  build_logs: Option<BuildLogs>,
}

fn require<'a, T>(slot: &'a Option<T>, key: StateKey) -> Result<&'a T, PipelineError> {
  slot.as_ref().ok_or(PipelineError::MissingState(key))
}

impl PipelineState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn has(&self, key: StateKey) -> bool {
    match key {
      StateKey::Changes => self.changes.is_some(),
      StateKey::Entrypoints => self.entrypoints.is_some(),
      StateKey::Dependencies => self.dependencies.is_some(),
      StateKey::Targets => self.targets.is_some(),
      StateKey::RebuildTargets => self.rebuild_targets.is_some(),
      StateKey::BuildLogs => self.build_logs.is_some(),
    }
  }

  pub fn changes(&self) -> Result<&[String], PipelineError> {
    require(&self.changes, StateKey::Changes).map(Vec::as_slice)
  }

  pub fn entrypoints(&self) -> Result<&[String], PipelineError> {
    require(&self.entrypoints, StateKey::Entrypoints).map(Vec::as_slice)
  }

  pub fn dependencies(&self) -> Result<&DependencyMap, PipelineError> {
    require(&self.dependencies, StateKey::Dependencies)
  }

  pub fn targets(&self) -> Result<&[String], PipelineError> {
    require(&self.targets, StateKey::Targets).map(Vec::as_slice)
  }

  /// The final rebuild set. Its absence is the run-level failure, not a state error.
  pub fn rebuild_targets(&self) -> Result<&[String], PipelineError> {
    self.rebuild_targets.as_deref().ok_or(PipelineError::NoRebuildTargets)
  }

  pub fn build_logs(&self) -> Result<&BuildLogs, PipelineError> {
    require(&self.build_logs, StateKey::BuildLogs)
  }

  pub fn with_changes(mut self, changes: Vec<String>) -> Self {
    self.changes = Some(changes);
    self
  }

  pub fn with_entrypoints(mut self, entrypoints: Vec<String>) -> Self {
    self.entrypoints = Some(entrypoints);
    self
  }

  pub fn with_dependencies(mut self, dependencies: DependencyMap) -> Self {
    self.dependencies = Some(dependencies);
    self
  }

  pub fn with_targets(mut self, targets: Vec<String>) -> Self {
    self.targets = Some(targets);
    self
  }

  pub fn with_rebuild_targets(mut self, targets: Vec<String>) -> Self {
    self.rebuild_targets = Some(targets);
    self
  }

  pub fn with_build_logs(mut self, logs: BuildLogs) -> Self {
    self.build_logs = Some(logs);
    self
  }

  /// Consume the state, yielding the final rebuild set.
  pub fn into_rebuild_targets(self) -> Result<Vec<String>, PipelineError> {
    self.rebuild_targets.ok_or(PipelineError::NoRebuildTargets)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_slots_fail_fast() {
    let state = PipelineState::new();
    assert!(matches!(
      state.changes(),
      Err(PipelineError::MissingState(StateKey::Changes))
    ));
    assert!(matches!(
      state.dependencies(),
      Err(PipelineError::MissingState(StateKey::Dependencies))
    ));
    assert!(matches!(state.rebuild_targets(), Err(PipelineError::NoRebuildTargets)));
  }

  #[test]
  fn empty_slot_is_still_present() {
    let state = PipelineState::new().with_changes(vec![]);
    assert!(state.has(StateKey::Changes));
    assert!(state.changes().unwrap().is_empty());
    assert!(!state.has(StateKey::Entrypoints));
  }

  #[test]
  fn slots_accumulate() {
    let state = PipelineState::new()
      .with_changes(vec!["pkg/foo/a.go".into()])
      .with_targets(vec!["cmd/foo".into()])
      .with_rebuild_targets(vec!["cmd/foo".into()]);
    assert_eq!(state.changes().unwrap(), ["pkg/foo/a.go"]);
    assert_eq!(state.targets().unwrap(), ["cmd/foo"]);
    assert_eq!(state.into_rebuild_targets().unwrap(), vec!["cmd/foo"]);
  }

  #[test]
  fn keys_display_contract_names() {
    assert_eq!(StateKey::RebuildTargets.to_string(), "rebuild targets");
    assert_eq!(StateKey::BuildLogs.to_string(), "build logs");
  }
}
