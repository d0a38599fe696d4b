//! Entrypoint discovery: which buildable units live under the prefix.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::stage::Stage;
use crate::state::PipelineState;
use crate::util::path::normalize;

pub struct EntrypointStage {
  pub prefix: String,
  pub skip_nested: bool,
  pub working_directory: Option<PathBuf>,
}

impl EntrypointStage {
  pub fn new(prefix: impl Into<String>, skip_nested: bool, working_directory: Option<PathBuf>) -> Self {
    Self {
      prefix: prefix.into(),
      skip_nested,
      working_directory,
    }
  }

  /// The prefix as seen from the process, i.e. joined onto the working directory.
  fn prefix_on_disk(&self) -> PathBuf {
    match &self.working_directory {
      Some(dir) => dir.join(&self.prefix),
      None => PathBuf::from(&self.prefix),
    }
  }

  /// Immediate subdirectories of the prefix, as normalized `prefix/name` paths.
  fn nested_entrypoints(&self, dir: &Path) -> Result<Vec<String>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut entrypoints = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
      let name = entry.file_name();
      let file_type = entry.file_type().map_err(|e| PipelineError::io(entry.path(), e))?;
      debug!(entry = %name.to_string_lossy(), is_dir = file_type.is_dir(), "inspecting entry");

      if file_type.is_dir() {
        entrypoints.push(normalize(&format!("{}/{}", self.prefix, name.to_string_lossy())));
      }
    }
    entrypoints.sort();
    Ok(entrypoints)
  }
}

impl Stage for EntrypointStage {
  fn name(&self) -> &'static str {
    "entrypoints"
  }

  fn precheck(&self, state: &PipelineState) -> Result<(), PipelineError> {
    if state.changes()?.is_empty() {
      return Err(PipelineError::NoChangesFound);
    }

    let path = self.prefix_on_disk();
    let metadata = match fs::metadata(&path) {
      Ok(metadata) => metadata,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(PipelineError::PrefixNotFound { path });
      }
      Err(e) => return Err(PipelineError::io(path, e)),
    };
    if !metadata.is_dir() {
      return Err(PipelineError::PrefixNotDirectory { path });
    }
    Ok(())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    info!(prefix = %self.prefix, nested = !self.skip_nested, "discovering entrypoints");

    let entrypoints = if self.skip_nested {
      vec![normalize(&self.prefix)]
    } else {
      self.nested_entrypoints(&self.prefix_on_disk())?
    };

    info!(entrypoints = %entrypoints.join(", "), "discovered entrypoints");
    Ok(state.with_entrypoints(entrypoints))
  }
}
