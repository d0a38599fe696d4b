//! Reporting: render the target list and decide whether it becomes the rebuild set.

use std::io::{self, Stdout, Write};
use std::sync::Mutex;

use tracing::info;

use crate::config::OutputFormat;
use crate::error::PipelineError;
use crate::stage::Stage;
use crate::state::PipelineState;

pub struct ReportStage<W = Stdout> {
  pub format: String,
  /// Hand the targets on as the rebuild set once they are rendered.
  pub build_after_report: bool,
  out: Mutex<W>,
}

impl ReportStage<Stdout> {
  pub fn new(format: impl Into<String>, build_after_report: bool) -> Self {
    Self::with_writer(format, build_after_report, io::stdout())
  }
}

impl<W: Write> ReportStage<W> {
  pub fn with_writer(format: impl Into<String>, build_after_report: bool, out: W) -> Self {
    Self {
      format: format.into(),
      build_after_report,
      out: Mutex::new(out),
    }
  }

  pub fn into_writer(self) -> W {
    self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn output_format(&self) -> Result<OutputFormat, PipelineError> {
    OutputFormat::parse(&self.format).ok_or_else(|| PipelineError::InvalidOutputFormat(self.format.clone()))
  }

  fn render(&self, format: OutputFormat, targets: &[String]) -> Result<(), PipelineError> {
    let rendered = match format {
      OutputFormat::Json => serde_json::to_string(targets)?,
      OutputFormat::Txt => targets.join("\n"),
    };

    let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    writeln!(out, "{}", rendered)
      .and_then(|_| out.flush())
      .map_err(|e| PipelineError::io("<report output>", e))
  }
}

impl<W: Write> Stage for ReportStage<W> {
  fn name(&self) -> &'static str {
    "report"
  }

  fn precheck(&self, _state: &PipelineState) -> Result<(), PipelineError> {
    self.output_format().map(|_| ())
  }

  async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
    let format = self.output_format()?;
    let targets = state.targets()?.to_vec();

    info!(format = %format, targets = %targets.join(", "), "reporting targets");
    self.render(format, &targets)?;

    if !self.build_after_report {
      info!("report is terminal, no rebuild set produced");
      return Ok(state);
    }
    Ok(state.with_rebuild_targets(targets))
  }
}
