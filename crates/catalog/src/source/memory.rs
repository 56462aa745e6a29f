//! In-memory catalog source for tests and demos.
//!
//! Deterministic stand-in for the HTTP client: seedable per-category data,
//! broadcast-backed change and snapshot channels, injectable failures, and
//! response gates that let a test dictate the resolution order of
//! overlapping fetches.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, oneshot};
use tracing::warn;

use bayberry_core::{Category, ProductId};

use super::record::{RawProductDetail, RawProductRecord};
use super::{
    ChangeSignal, ChangeStream, ProductSource, SnapshotSource, SnapshotStream, SourceError,
};

const CHANNEL_CAPACITY: usize = 64;

/// A gate blocking one pending list response.
///
/// The response's data was captured when the fetch arrived; releasing the
/// gate lets that captured data resolve, regardless of what the catalog
/// holds by then. Dropping the gate unreleased also unblocks the response.
#[derive(Debug)]
pub struct HeldList {
    release: oneshot::Sender<()>,
}

impl HeldList {
    /// Let the blocked response resolve.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

/// In-memory implementation of both source boundaries.
///
/// Cheap to clone; all clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    products: RwLock<HashMap<Category, Vec<RawProductRecord>>>,
    details: RwLock<HashMap<ProductId, RawProductDetail>>,
    change_txs: HashMap<Category, broadcast::Sender<ChangeSignal>>,
    snapshot_tx: broadcast::Sender<Vec<RawProductRecord>>,
    list_holds: Mutex<HashMap<Category, VecDeque<oneshot::Receiver<()>>>>,
    failing_lists: Mutex<HashSet<Category>>,
    failing_changes: Mutex<HashSet<Category>>,
    failing_details: AtomicBool,
    failing_snapshots: AtomicBool,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl Default for MemoryInner {
    fn default() -> Self {
        let change_txs = Category::ALL
            .into_iter()
            .map(|category| (category, broadcast::channel(CHANNEL_CAPACITY).0))
            .collect();
        Self {
            products: RwLock::new(HashMap::new()),
            details: RwLock::new(HashMap::new()),
            change_txs,
            snapshot_tx: broadcast::channel(CHANNEL_CAPACITY).0,
            list_holds: Mutex::new(HashMap::new()),
            failing_lists: Mutex::new(HashSet::new()),
            failing_changes: Mutex::new(HashSet::new()),
            failing_details: AtomicBool::new(false),
            failing_snapshots: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a category's product list. Does not notify anyone; pair
    /// with [`Self::notify_changed`] to simulate an upstream change.
    pub fn set_products(&self, category: Category, records: Vec<RawProductRecord>) {
        self.inner
            .products
            .write()
            .expect("lock poisoned")
            .insert(category, records);
    }

    /// Emit a change signal on a category's channel.
    pub fn notify_changed(&self, category: Category) {
        if let Some(tx) = self.inner.change_txs.get(&category) {
            // No subscribers is fine; the signal just goes nowhere.
            let _ = tx.send(ChangeSignal);
        }
    }

    /// Deliver a full-collection snapshot to all snapshot subscribers.
    pub fn push_snapshot(&self, records: Vec<RawProductRecord>) {
        let _ = self.inner.snapshot_tx.send(records);
    }

    /// Seed a detail record, keyed by the id it carries.
    pub fn set_detail(&self, detail: RawProductDetail) {
        let id = ProductId::new(detail.product.id.clone().unwrap_or_default());
        self.inner
            .details
            .write()
            .expect("lock poisoned")
            .insert(id, detail);
    }

    /// Gate the next list fetch for a category. Gates queue in FIFO order
    /// when stacked.
    pub fn hold_next_list(&self, category: Category) -> HeldList {
        let (tx, rx) = oneshot::channel();
        self.inner
            .list_holds
            .lock()
            .expect("lock poisoned")
            .entry(category)
            .or_default()
            .push_back(rx);
        HeldList { release: tx }
    }

    /// Make list fetches for a category fail until cleared.
    pub fn fail_lists(&self, category: Category, failing: bool) {
        let mut set = self.inner.failing_lists.lock().expect("lock poisoned");
        if failing {
            set.insert(category);
        } else {
            set.remove(&category);
        }
    }

    /// Make change subscriptions for a category fail to open.
    pub fn fail_changes(&self, category: Category, failing: bool) {
        let mut set = self.inner.failing_changes.lock().expect("lock poisoned");
        if failing {
            set.insert(category);
        } else {
            set.remove(&category);
        }
    }

    /// Make detail fetches fail until cleared.
    pub fn fail_details(&self, failing: bool) {
        self.inner.failing_details.store(failing, Ordering::Relaxed);
    }

    /// Make snapshot subscriptions fail to open.
    pub fn fail_snapshots(&self, failing: bool) {
        self.inner
            .failing_snapshots
            .store(failing, Ordering::Relaxed);
    }

    /// Number of list fetches issued so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.inner.list_calls.load(Ordering::Relaxed)
    }

    /// Number of detail fetches issued so far.
    #[must_use]
    pub fn detail_calls(&self) -> usize {
        self.inner.detail_calls.load(Ordering::Relaxed)
    }

    /// Live change subscriptions on a category's channel.
    #[must_use]
    pub fn change_subscribers(&self, category: Category) -> usize {
        self.inner
            .change_txs
            .get(&category)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Live snapshot subscriptions.
    #[must_use]
    pub fn snapshot_subscribers(&self) -> usize {
        self.inner.snapshot_tx.receiver_count()
    }
}

#[async_trait]
impl ProductSource for InMemoryCatalog {
    async fn list_products(
        &self,
        category: Category,
    ) -> Result<Vec<RawProductRecord>, SourceError> {
        self.inner.list_calls.fetch_add(1, Ordering::Relaxed);

        if self
            .inner
            .failing_lists
            .lock()
            .expect("lock poisoned")
            .contains(&category)
        {
            return Err(SourceError::Status {
                status: 500,
                body: "injected list failure".to_string(),
            });
        }

        // Capture before parking on any gate: a held response resolves
        // with the data as of the fetch, not as of the release.
        let captured = self
            .inner
            .products
            .read()
            .expect("lock poisoned")
            .get(&category)
            .cloned()
            .unwrap_or_default();

        let gate = self
            .inner
            .list_holds
            .lock()
            .expect("lock poisoned")
            .get_mut(&category)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        Ok(captured)
    }

    async fn product_detail(&self, id: &ProductId) -> Result<RawProductDetail, SourceError> {
        self.inner.detail_calls.fetch_add(1, Ordering::Relaxed);

        if self.inner.failing_details.load(Ordering::Relaxed) {
            return Err(SourceError::Status {
                status: 500,
                body: "injected detail failure".to_string(),
            });
        }

        self.inner
            .details
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn subscribe_changes(&self, category: Category) -> Result<ChangeStream, SourceError> {
        if self
            .inner
            .failing_changes
            .lock()
            .expect("lock poisoned")
            .contains(&category)
        {
            return Err(SourceError::Subscription(
                "injected subscription failure".to_string(),
            ));
        }

        let Some(tx) = self.inner.change_txs.get(&category) else {
            return Err(SourceError::Subscription(format!(
                "no channel for {category}"
            )));
        };
        Ok(broadcast_stream(tx.subscribe()).boxed())
    }
}

#[async_trait]
impl SnapshotSource for InMemoryCatalog {
    async fn subscribe_snapshots(&self) -> Result<SnapshotStream, SourceError> {
        if self.inner.failing_snapshots.load(Ordering::Relaxed) {
            return Err(SourceError::Subscription(
                "injected subscription failure".to_string(),
            ));
        }
        Ok(broadcast_stream(self.inner.snapshot_tx.subscribe()).boxed())
    }
}

fn broadcast_stream<T: Clone + Send + 'static>(
    rx: broadcast::Receiver<T>,
) -> impl Stream<Item = T> + Send {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "in-memory subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(id: &str) -> RawProductRecord {
        RawProductRecord {
            id: Some(id.to_string()),
            ..RawProductRecord::default()
        }
    }

    #[tokio::test]
    async fn test_list_returns_seeded_records() {
        let catalog = InMemoryCatalog::new();
        catalog.set_products(Category::Apparel, vec![record("p1"), record("p2")]);

        let records = catalog.list_products(Category::Apparel).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(catalog.list_calls(), 1);
        assert!(
            catalog
                .list_products(Category::Prints)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_held_list_resolves_with_captured_data() {
        let catalog = InMemoryCatalog::new();
        catalog.set_products(Category::Apparel, vec![record("old")]);
        let gate = catalog.hold_next_list(Category::Apparel);

        let fetcher = catalog.clone();
        let pending =
            tokio::spawn(async move { fetcher.list_products(Category::Apparel).await });
        while catalog.list_calls() == 0 {
            tokio::task::yield_now().await;
        }

        catalog.set_products(Category::Apparel, vec![record("new")]);
        gate.release();

        let records = pending.await.unwrap().unwrap();
        assert_eq!(records[0].id.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_injected_list_failure() {
        let catalog = InMemoryCatalog::new();
        catalog.fail_lists(Category::Apparel, true);

        let err = catalog.list_products(Category::Apparel).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 500, .. }));

        catalog.fail_lists(Category::Apparel, false);
        assert!(catalog.list_products(Category::Apparel).await.is_ok());
    }

    #[tokio::test]
    async fn test_detail_lookup_and_not_found() {
        let catalog = InMemoryCatalog::new();
        catalog.set_detail(RawProductDetail {
            product: record("p1"),
            variants: None,
        });

        let detail = catalog.product_detail(&ProductId::new("p1")).await.unwrap();
        assert_eq!(detail.product.id.as_deref(), Some("p1"));

        let err = catalog
            .product_detail(&ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
        assert_eq!(catalog.detail_calls(), 2);
    }

    #[tokio::test]
    async fn test_change_signal_reaches_subscriber() {
        let catalog = InMemoryCatalog::new();
        let mut changes = catalog.subscribe_changes(Category::Apparel).await.unwrap();
        assert_eq!(catalog.change_subscribers(Category::Apparel), 1);

        catalog.notify_changed(Category::Apparel);
        assert_eq!(changes.next().await, Some(ChangeSignal));

        drop(changes);
        assert_eq!(catalog.change_subscribers(Category::Apparel), 0);
    }

    #[tokio::test]
    async fn test_snapshot_reaches_subscriber() {
        let catalog = InMemoryCatalog::new();
        let mut snapshots = catalog.subscribe_snapshots().await.unwrap();

        catalog.push_snapshot(vec![record("s1")]);

        let delivery = snapshots.next().await.unwrap();
        assert_eq!(delivery[0].id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_failed_subscription_does_not_open() {
        let catalog = InMemoryCatalog::new();
        catalog.fail_changes(Category::Apparel, true);

        assert!(catalog.subscribe_changes(Category::Apparel).await.is_err());
        assert_eq!(catalog.change_subscribers(Category::Apparel), 0);
    }
}
