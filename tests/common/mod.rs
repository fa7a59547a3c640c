//! Common test utilities and fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: Fixture loaders and mock provider endpoints
//! - `log_capture`: Tracing capture for log assertions
//! - `logger`: Structured test narration

pub mod fixtures;
pub mod log_capture;
pub mod logger;
