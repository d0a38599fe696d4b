//! artifact-lib: decide which build entrypoints a change range affects, and rebuild them.
//!
//! A run threads a [`state::PipelineState`] through a fixed sequence of stages:
//! - `changeset`: files changed between two git revisions
//! - `entrypoints`: buildable units under the configured prefix
//! - `dependencies`: first-party packages each entrypoint imports
//! - `impact`: entrypoints whose dependencies sit in a changed directory
//! - `report`: render the targets, pick the rebuild set
//! - `rebuild`: run the build command for each target
//!
//! [`pipeline::Pipeline`] drives the stages from a [`config::BuildConfig`].

pub mod config;
pub mod error;
pub mod logs;
pub mod pipeline;
pub mod process;
pub mod stage;
pub mod state;
pub mod util;

pub use config::{BuildConfig, OutputFormat};
pub use error::PipelineError;
pub use pipeline::Pipeline;
