//! Bayberry catalog engine.
//!
//! Keeps a live, filtered, paginated view of the product catalog in sync
//! with remote sources and remembers the user's browsing context between
//! sessions. The pieces:
//!
//! - [`source`] - boundaries to the remote catalog (HTTP + SSE in
//!   production, an in-memory fake for tests and demos) and the mapper
//!   that normalizes raw records into domain products
//! - [`feed`] - per-category replication: a signal-driven refetch feed and
//!   a snapshot push feed behind one activation surface
//! - [`nav`] - the durable navigational state store with its one-way
//!   projection into the address bar
//! - [`controller`] - the view controller tying feeds, pricing, and
//!   navigation together
//! - [`config`] - environment-driven configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod controller;
pub mod error;
pub mod feed;
pub mod nav;
pub mod source;

pub use error::{CatalogError, Result};
