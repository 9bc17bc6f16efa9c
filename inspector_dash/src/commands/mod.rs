//! CLI command implementations

pub mod config;
pub mod output;
pub mod snapshot;
pub mod watch;
