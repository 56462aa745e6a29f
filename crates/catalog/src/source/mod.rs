//! Boundaries to the remote catalog.
//!
//! Everything upstream of the mapper speaks in raw records
//! ([`record::RawProductRecord`] and friends); domain types never cross
//! these traits. Two implementations ship with the crate: the HTTP + SSE
//! client used in production ([`HttpCatalogSource`]) and an in-memory fake
//! for tests and demos ([`memory::InMemoryCatalog`]).

pub mod mapper;
pub mod memory;
pub mod record;

mod http;
mod sse;

pub use http::HttpCatalogSource;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use bayberry_core::{Category, ProductId};

use record::{RawProductDetail, RawProductRecord};

/// A payload-free "something changed" notification.
///
/// Deliberately carries nothing: consumers react by refetching the full
/// collection, never by patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// Stream of change signals for one category. Dropping the stream closes
/// the subscription.
pub type ChangeStream = BoxStream<'static, ChangeSignal>;

/// Stream of full-collection snapshots. Dropping the stream closes the
/// subscription.
pub type SnapshotStream = BoxStream<'static, Vec<RawProductRecord>>;

/// Errors from remote catalog operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code returned by the API
        status: u16,
        /// Response body, truncated for logging
        body: String,
    },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A push subscription could not be opened
    #[error("subscription error: {0}")]
    Subscription(String),
}

/// Pull boundary: product lists and details.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the full product list for a category.
    async fn list_products(&self, category: Category)
    -> Result<Vec<RawProductRecord>, SourceError>;

    /// Fetch one product with its variants.
    async fn product_detail(&self, id: &ProductId) -> Result<RawProductDetail, SourceError>;

    /// Open the change-signal subscription for a category.
    async fn subscribe_changes(&self, category: Category) -> Result<ChangeStream, SourceError>;
}

/// Push boundary: wholesale collection snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Open the snapshot subscription.
    async fn subscribe_snapshots(&self) -> Result<SnapshotStream, SourceError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = SourceError::Status {
            status: 502,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: upstream unavailable");
    }

    #[test]
    fn test_subscription_error_display() {
        let err = SourceError::Subscription("HTTP 401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "subscription error: HTTP 401 Unauthorized");
    }
}
