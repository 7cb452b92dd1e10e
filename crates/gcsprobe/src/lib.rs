//! gcsprobe: an external test harness for the `gcloud storage` CLI.
//!
//! The harness drives the real CLI through a shell, parses its semi-structured
//! output into typed results, and validates freshly generated signed URLs by
//! driving a headless browser and inspecting HTTP status, page content, and
//! browser security-chrome state for phishing interstitials.

#![forbid(unsafe_code)]
// Library documentation is in progress. Public API types have docs;
// internal types will be documented in future releases.
#![allow(missing_docs)]

pub mod browser;
pub mod config;
pub mod error;
pub mod exec;
pub mod fixtures;
pub mod model;
pub mod storage;

pub use crate::error::{HarnessError, HarnessResult};
pub use crate::model::*;
