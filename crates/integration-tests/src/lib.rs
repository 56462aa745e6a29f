//! Integration tests for Bayberry.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bayberry-integration-tests
//! ```
//!
//! Everything runs against the in-memory catalog source: no network and no
//! clock dependence. Tests that need to order overlapping fetches use the
//! source's response gates; tests that wait on the controller go through
//! the bounded helpers here instead of sleeping.
//!
//! # Test Files
//!
//! - `catalog_feeds` - Feed activation, refetching, snapshots, teardown
//! - `catalog_view` - Filtering, paging, pricing, detail views, scrolling
//! - `nav_state` - Persistence, rehydration, and the location mirror

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use bayberry_catalog::controller::{CatalogController, CatalogData};
use bayberry_catalog::feed::CatalogSources;
use bayberry_catalog::nav::{HistoryStack, MemoryStorage, NavStore, StateStorage};
use bayberry_catalog::source::memory::InMemoryCatalog;
use bayberry_catalog::source::record::{RawProductDetail, RawProductRecord};

/// How long the wait helpers poll before declaring a test hung.
pub const WAIT_BUDGET: Duration = Duration::from_secs(2);

/// A fully wired controller over an in-memory catalog.
pub struct TestCatalog {
    pub source: InMemoryCatalog,
    pub history: Arc<HistoryStack>,
    pub controller: CatalogController,
    pub updates: watch::Receiver<CatalogData>,
}

impl TestCatalog {
    /// Harness with empty storage and a fresh history stack.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Box::new(MemoryStorage::new()), HistoryStack::new())
    }

    /// Harness over explicit storage and history, for restore scenarios.
    #[must_use]
    pub fn with_parts(storage: Box<dyn StateStorage>, history: HistoryStack) -> Self {
        let source = InMemoryCatalog::new();
        let history = Arc::new(history);
        let nav = NavStore::new(storage, Some(history.clone()));
        let controller =
            CatalogController::new(CatalogSources::from_single(source.clone()), nav);
        let updates = controller.subscribe();
        Self {
            source,
            history,
            controller,
            updates,
        }
    }

    /// Start serving and wait for the first update to land.
    pub async fn start_and_settle(&mut self) -> CatalogData {
        self.controller.start();
        self.settled().await
    }

    /// Wait until the catalog leaves its loading state.
    pub async fn settled(&mut self) -> CatalogData {
        wait_for(&mut self.updates, |data| !data.loading).await
    }

    /// Wait until the settled product list carries exactly these ids.
    pub async fn settled_with_ids(&mut self, ids: &[&str]) -> CatalogData {
        wait_for(&mut self.updates, |data| {
            !data.loading
                && data
                    .products
                    .iter()
                    .map(|product| product.id.as_str())
                    .eq(ids.iter().copied())
        })
        .await
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a watch receiver until `pred` holds, within the wait budget.
pub async fn wait_for(
    rx: &mut watch::Receiver<CatalogData>,
    mut pred: impl FnMut(&CatalogData) -> bool,
) -> CatalogData {
    tokio::time::timeout(WAIT_BUDGET, async {
        loop {
            {
                let data = rx.borrow_and_update();
                if pred(&data) {
                    return data.clone();
                }
            }
            rx.changed().await.expect("catalog channel closed");
        }
    })
    .await
    .expect("timed out waiting for a catalog update")
}

/// Poll a condition until it holds, within the wait budget.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT_BUDGET, async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

/// Let already-scheduled tasks run without waiting on anything specific.
pub async fn drain_tasks() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Raw record with an id, a name, and a price.
#[must_use]
pub fn record(id: &str, name: &str, price: &str) -> RawProductRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "price": price,
    }))
    .expect("record fixture")
}

/// Raw record with an original price above the display price.
#[must_use]
pub fn discounted(id: &str, name: &str, price: &str, original: &str) -> RawProductRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "price": price,
        "originalPrice": original,
    }))
    .expect("record fixture")
}

/// Sequential records `Item 01..=count` for paging tests.
#[must_use]
pub fn numbered(count: usize) -> Vec<RawProductRecord> {
    (1..=count)
        .map(|n| record(&format!("p{n:02}"), &format!("Item {n:02}"), "20.00"))
        .collect()
}

/// Detail payload with `(id, tier, price)` variants.
#[must_use]
pub fn detail(id: &str, name: &str, price: &str, variants: &[(&str, &str, &str)]) -> RawProductDetail {
    let variants: Vec<serde_json::Value> = variants
        .iter()
        .map(|(vid, tier, vprice)| {
            serde_json::json!({
                "id": vid,
                "tier": tier,
                "price": vprice,
            })
        })
        .collect();
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "price": price,
        "variants": variants,
    }))
    .expect("detail fixture")
}
