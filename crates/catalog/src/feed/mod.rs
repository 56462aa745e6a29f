//! Category feeds: live replication of remote product collections.
//!
//! One activation surface, two transports. The signal feed refetches the
//! full list whenever the source says something changed; the snapshot feed
//! receives whole collections pushed by the source. Which transport backs
//! a category is wired once in [`FeedBackend::for_category`]; callers
//! activate a category and consume [`FeedUpdate`]s without ever branching
//! on the transport.
//!
//! Updates are always wholesale replacements. Nothing diffs, merges, or
//! patches.

mod signal;
mod snapshot;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use bayberry_core::{Category, Product};

use crate::source::{ProductSource, SnapshotSource, SourceError};

/// Update emitted by an active feed.
#[derive(Debug)]
pub enum FeedUpdate {
    /// Wholesale replacement of the category's product list.
    Replace {
        category: Category,
        products: Vec<Product>,
    },
    /// A list fetch failed; the category degrades to an empty list.
    FetchFailed {
        category: Category,
        error: SourceError,
    },
}

/// The transport backing a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedBackend {
    /// Change signals trigger full refetches.
    Signal,
    /// The source pushes whole collections.
    Snapshot,
}

impl FeedBackend {
    /// Fixed transport wiring, decided per category at this one spot.
    #[must_use]
    pub const fn for_category(category: Category) -> Self {
        match category {
            Category::Apparel => Self::Signal,
            Category::Prints => Self::Snapshot,
        }
    }
}

/// The sources a feed activation draws from.
#[derive(Clone)]
pub struct CatalogSources {
    pub products: Arc<dyn ProductSource>,
    pub snapshots: Arc<dyn SnapshotSource>,
}

impl CatalogSources {
    /// Wrap one value that implements both boundaries.
    pub fn from_single<S>(source: S) -> Self
    where
        S: ProductSource + SnapshotSource + Clone + 'static,
    {
        Self {
            products: Arc::new(source.clone()),
            snapshots: Arc::new(source),
        }
    }
}

/// Cancels the activation's tasks when shut down or dropped.
///
/// Dropping the handle closes the feed's subscriptions; in-flight fetches
/// may still complete but their results land in a closed channel.
#[derive(Debug)]
pub struct FeedHandle {
    category: Category,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// The category this activation serves.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// A token that fires when this activation is torn down.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the activation's tasks.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Activate the feed for a category.
///
/// Spawns the transport task matching the category's wiring and returns a
/// handle that tears it down. Updates arrive on `updates` in delivery
/// order; the sender side is dropped when the activation ends.
pub fn activate(
    category: Category,
    sources: &CatalogSources,
    updates: mpsc::UnboundedSender<FeedUpdate>,
) -> FeedHandle {
    let cancel = CancellationToken::new();
    let backend = FeedBackend::for_category(category);

    match backend {
        FeedBackend::Signal => {
            tokio::spawn(signal::run(
                category,
                Arc::clone(&sources.products),
                updates,
                cancel.clone(),
            ));
        }
        FeedBackend::Snapshot => {
            tokio::spawn(snapshot::run(
                category,
                Arc::clone(&sources.snapshots),
                updates,
                cancel.clone(),
            ));
        }
    }

    info!(category = %category, backend = ?backend, "feed activated");
    FeedHandle { category, cancel }
}
