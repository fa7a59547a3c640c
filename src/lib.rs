//! keycheck - LLM provider API key validation
//!
//! Checks whether a credential is accepted by its provider and, when it is,
//! attaches a best-effort estimate of remaining quota. Served over HTTP
//! (`POST /validate`) and from the command line.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod server;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, KeycheckError, Result};
