//! Shared utilities.
//!
//! Path normalization helpers and cross-platform test helpers.

pub mod path;

#[cfg(test)]
pub mod testutil;
