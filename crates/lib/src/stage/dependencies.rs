//! Dependency extraction: the first-party packages each entrypoint pulls in.
//!
//! The Go toolchain reports the full transitive closure of an entrypoint's
//! imports. Only entries under the repository's own import path are kept, with
//! that path stripped so they line up with repository-relative directories.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::process::{CommandRunner, Invocation, output_lines};
use crate::stage::Stage;
use crate::state::{DependencyMap, PipelineState};

/// Go template printing one dependency import path per line.
const DEPS_TEMPLATE: &str = r#"{{ join .Deps "\n" }}"#;

pub struct DependencyStage<R> {
  pub repo_basename: String,
  pub working_directory: Option<PathBuf>,
  /// Maximum number of toolchain queries in flight.
  pub jobs: usize,
  runner: Arc<R>,
}

impl<R: CommandRunner + 'static> DependencyStage<R> {
  pub fn new(
    repo_basename: impl Into<String>,
    working_directory: Option<PathBuf>,
    jobs: usize,
    runner: Arc<R>,
  ) -> Self {
    Self {
      repo_basename: repo_basename.into(),
      working_directory,
      jobs: jobs.max(1),
      runner,
    }
  }

  /// `go list -f '{{ join .Deps "\n" }}' ./<entrypoint>`
  pub fn invocation(&self, entrypoint: &str) -> Invocation {
    Invocation::new("go")
      .args(["list", "-f", DEPS_TEMPLATE])
      .arg(format!("./{}", entrypoint))
      .current_dir(self.working_directory.as_deref())
  }
}

/// Map a dependency import path to a repository-relative path if it is first-party.
///
/// `github.com/acme/repo/pkg/foo` with basename `github.com/acme/repo` becomes
/// `pkg/foo`; the module root itself becomes `.`. A trailing `/` on the basename
/// is ignored. Anything outside the basename, including a sibling such as
/// `github.com/acme/repository`, is third-party and yields `None`.
pub fn first_party_path(dependency: &str, basename: &str) -> Option<String> {
  let base = basename.trim_end_matches('/');
  if base.is_empty() {
    return Some(dependency.to_string());
  }
  if dependency == base {
    return Some(".".to_string());
  }
  dependency
    .strip_prefix(base)
    .and_then(|rest| rest.strip_prefix('/'))
    .filter(|rest| !rest.is_empty())
    .map(str::to_string)
}

/// Keep first-party entries, stripped and de-duplicated in first-seen order.
pub fn filter_first_party(entrypoint: &str, dependencies: &[String], basename: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut kept = Vec::new();
  for dependency in dependencies {
    if let Some(path) = first_party_path(dependency, basename) {
      if seen.insert(path.clone()) {
        debug!(entrypoint = %entrypoint, dependency = %dependency, "found first-party dependency");
        kept.push(path);
      }
    }
  }
  kept
}

impl<R: CommandRunner + 'static> Stage for DependencyStage<R> {
  fn name(&self) -> &'static str {
    "dependencies"
  }

  fn precheck(&self, _state: &PipelineState) -> Result<(), PipelineError> {
    if self.repo_basename.is_empty() {
      warn!("repo basename is empty, every dependency will be treated as first-party");
    }
    Ok(())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    info!(basename = %self.repo_basename, jobs = self.jobs, "identifying entrypoint dependencies");

    let entrypoints = state.entrypoints()?.to_vec();
    let semaphore = Arc::new(Semaphore::new(self.jobs));
    let mut join_set = JoinSet::new();

    for entrypoint in entrypoints {
      let invocation = self.invocation(&entrypoint);
      let runner = self.runner.clone();
      let semaphore = semaphore.clone();

      join_set.spawn(async move {
        let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
        let output = runner.output(&invocation).await?;
        Ok::<_, PipelineError>((entrypoint, output_lines(&output)))
      });
    }

    let mut dependencies = DependencyMap::new();
    while let Some(joined) = join_set.join_next().await {
      // Dropping the set on early return aborts the queries still in flight.
      let (entrypoint, deps) = joined??;
      let first_party = filter_first_party(&entrypoint, &deps, &self.repo_basename);
      if first_party.is_empty() {
        debug!(entrypoint = %entrypoint, "no first-party dependencies");
        continue;
      }
      dependencies.insert(entrypoint, first_party);
    }

    if dependencies.is_empty() {
      return Err(PipelineError::NoDependenciesFound);
    }
    info!(entrypoints = dependencies.len(), "identified dependencies");
    Ok(state.with_dependencies(dependencies))
  }
}
