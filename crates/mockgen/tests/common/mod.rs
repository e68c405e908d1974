//! Shared test utilities for mockgen integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a file-backed database to in-process vendor fakes
//! - Builders for rendered images and configurations

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeVendor, TestHarness, UrlFetcher};
