//! Implementation of the `artifact build` command.
//!
//! Resolves flags and CI environment variables into a [`BuildConfig`], runs the
//! pipeline and summarises which targets were rebuilt.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use tracing::info;

use artifact_lib::config::{BuildConfig, DEFAULT_BUILD_COMMAND, DEFAULT_CMD_PREFIX};
use artifact_lib::Pipeline;

use crate::output::{format_duration, plural, print_info, print_json, print_success, print_target, print_warning};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Log the build commands without running them
  #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
  pub dry_run: bool,

  /// Directory to run git, go and the build command in
  #[arg(long)]
  pub working_directory: Option<PathBuf>,

  /// Last built revision (falls back to $ARTIFACT_GIT_RANGE_START, $GIT_PREVIOUS_COMMIT)
  #[arg(long, default_value = "")]
  pub git_range_start: String,

  /// Revision being built (falls back to $ARTIFACT_GIT_RANGE_END, $GIT_COMMIT)
  #[arg(long, default_value = "")]
  pub git_range_end: String,

  /// Directory holding the entrypoints
  #[arg(long, default_value = DEFAULT_CMD_PREFIX)]
  pub cmd_prefix: String,

  /// Treat the prefix itself as the only entrypoint
  #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
  pub skip_nested_entrypoints: bool,

  /// Import path of the repository, e.g. github.com/acme/monorepo
  #[arg(long, default_value = "")]
  pub repo_basename: String,

  /// Output format for the target list: txt or json
  #[arg(long, default_value = "txt")]
  pub out_format: String,

  /// Build command; {{entrypoint}} is replaced by each target's local path
  #[arg(long, env = "ARTIFACT_BUILD_COMMAND", default_value = DEFAULT_BUILD_COMMAND)]
  pub build_command: String,

  /// Continue to the build after reporting (default: true for txt, false for json)
  #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
  pub build_after_report: Option<bool>,

  /// Maximum number of concurrent dependency queries
  #[arg(long, short = 'j')]
  pub jobs: Option<usize>,

  /// Write each target's build output to <DIR>/<target>.log
  #[arg(long, env = "ARTIFACT_LOG_DIR")]
  pub log_dir: Option<PathBuf>,

  /// Print the resolved configuration as JSON and exit
  #[arg(long)]
  pub print_config: bool,
}

impl BuildArgs {
  pub fn into_config(self) -> BuildConfig {
    let defaults = BuildConfig::default();
    BuildConfig {
      dry_run: self.dry_run,
      working_directory: self.working_directory.filter(|dir| !dir.as_os_str().is_empty()),
      git_range_start: self.git_range_start,
      git_range_end: self.git_range_end,
      cmd_prefix: self.cmd_prefix,
      skip_nested_entrypoints: self.skip_nested_entrypoints,
      repo_basename: self.repo_basename,
      out_format: self.out_format,
      build_command: self.build_command,
      build_after_report: self.build_after_report,
      jobs: self.jobs.unwrap_or(defaults.jobs),
      log_dir: self.log_dir,
    }
    .with_git_range_from_env()
  }
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let print_config = args.print_config;
  let config = args.into_config();

  if print_config {
    return print_json(&config);
  }

  if config.dry_run {
    print_warning("this is a dry run, no changes will be made");
  }

  let start = Instant::now();
  let pipeline = Pipeline::from_config(config);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let targets = rt.block_on(pipeline.run()).context("Build failed")?;

  let verb = if pipeline.config().dry_run { "Would rebuild" } else { "Rebuilt" };
  print_success(&format!("{} {}", verb, plural(targets.len(), "target")));
  for target in &targets {
    print_target(target);
  }
  print_info(&format!("Duration: {}", format_duration(start.elapsed())));
  info!(targets = ?targets, "build complete");

  Ok(())
}
