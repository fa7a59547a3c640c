//! CLI argument parsing and command dispatch.

pub mod args;
pub mod check;
pub mod providers;
pub mod serve;

pub use args::{Cli, Commands};
