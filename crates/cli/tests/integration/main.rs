//! End-to-end tests for `artifact build`.

#![cfg(unix)]

mod build_tests;
mod common;
