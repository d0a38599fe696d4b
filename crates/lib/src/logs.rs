//! Persisting captured build output.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::util::path::flatten;

/// Write `output` to `<dir>/<target>.log`, with the target's separators flattened.
///
/// Creates `dir` if needed and overwrites a log left by a previous run.
pub fn write_build_log(dir: &Path, target: &str, output: &[u8]) -> Result<PathBuf, PipelineError> {
  fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

  let path = dir.join(format!("{}.log", flatten(target)));
  fs::write(&path, output).map_err(|e| PipelineError::io(&path, e))?;
  Ok(path)
}
