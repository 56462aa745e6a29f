//! Bayberry Core - Shared types library.
//!
//! This crate provides common types used across all Bayberry components:
//! - `catalog` - Live catalog synchronization and navigational state engine
//! - `cli` - Command-line tools for state inspection and demos
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere, including inside synchronous render paths.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, categories, products, variants, and the
//!   variant price resolver

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
