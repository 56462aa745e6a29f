//! CLI command implementations.

pub mod demo;
pub mod fetch;
pub mod state;
