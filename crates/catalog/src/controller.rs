//! Catalog view controller.
//!
//! Ties the pieces together: activates the feed for the selected category,
//! applies wholesale updates in arrival order, projects the filtered and
//! paginated page, resolves display pricing, and drives the navigational
//! store for every user action. Detail lookups go through a bounded
//! in-memory cache that is flushed whenever the collection is replaced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use bayberry_core::{Category, PriceInfo, Product, ProductDetail, ProductId};

use crate::feed::{self, CatalogSources, FeedHandle, FeedUpdate};
use crate::nav::{NavPatch, NavStore};
use crate::source::{mapper, SourceError};

/// Products shown per page.
pub const PAGE_SIZE: usize = 6;

/// Frame granularity for scroll persistence.
const SCROLL_FLUSH_INTERVAL: Duration = Duration::from_millis(16);

const DETAIL_CACHE_SIZE: u64 = 1000;
const DETAIL_CACHE_TTL: Duration = Duration::from_secs(300);

/// The catalog as last replaced by the active feed.
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub products: Vec<Product>,
    /// True from activation until the first update lands.
    pub loading: bool,
}

/// A product paired with its resolved display pricing.
#[derive(Debug, Clone)]
pub struct ListedProduct {
    pub product: Product,
    pub price: PriceInfo,
}

/// One page of the filtered catalog.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Vec<ListedProduct>,
    pub loading: bool,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_matches: usize,
    pub category: Category,
    pub search: String,
}

/// A product detail with variant-resolved pricing.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub detail: ProductDetail,
    pub price: PriceInfo,
}

/// Scroll restoration the shell performs exactly once after the catalog
/// settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRestore {
    /// Product restoration won; scroll to the top.
    Top,
    /// Smooth-scroll to the saved offset.
    Offset(f64),
}

/// Filter products to a category and committed search text.
///
/// A product matches when its name or description contains the search
/// case-insensitively; empty search matches everything.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    category: Category,
    search: &str,
) -> Vec<&'a Product> {
    let needle = search.to_lowercase();
    products
        .iter()
        .filter(|product| product.category == category)
        .filter(|product| {
            needle.is_empty()
                || product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Number of pages for a filtered count at the fixed page size.
#[must_use]
pub fn total_pages(matches: usize) -> u32 {
    u32::try_from(matches.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

/// Clamp a 1-based page into `[1, total_pages]`; 1 when there are no pages.
#[must_use]
pub const fn clamp_page(page: u32, total_pages: u32) -> u32 {
    if total_pages == 0 || page == 0 {
        1
    } else if page > total_pages {
        total_pages
    } else {
        page
    }
}

fn page_start(page: u32) -> usize {
    PAGE_SIZE * usize::try_from(page.saturating_sub(1)).unwrap_or_default()
}

/// Live catalog view controller.
///
/// Cheap to clone; all clones share state. Dropping every clone tears down
/// the active feed.
#[derive(Clone)]
pub struct CatalogController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    sources: CatalogSources,
    nav: NavStore,
    catalog: watch::Sender<CatalogData>,
    details: Cache<(Category, ProductId), ProductDetail>,
    active: Mutex<Option<FeedHandle>>,
    scroll: ScrollCoalescer,
    restore: Mutex<RestoreState>,
}

#[derive(Default)]
struct RestoreState {
    saved_offset: Option<f64>,
    /// True until the first update after start; the location may still
    /// name a product whose restoration outranks the saved offset.
    location_pending: bool,
    scroll_to_top: bool,
}

#[derive(Default)]
struct ScrollCoalescer {
    pending: Mutex<Option<f64>>,
    flushing: AtomicBool,
}

impl CatalogController {
    #[must_use]
    pub fn new(sources: CatalogSources, nav: NavStore) -> Self {
        let details = Cache::builder()
            .max_capacity(DETAIL_CACHE_SIZE)
            .time_to_live(DETAIL_CACHE_TTL)
            .build();
        let (catalog, _) = watch::channel(CatalogData::default());
        Self {
            inner: Arc::new(ControllerInner {
                sources,
                nav,
                catalog,
                details,
                active: Mutex::new(None),
                scroll: ScrollCoalescer::default(),
                restore: Mutex::new(RestoreState::default()),
            }),
        }
    }

    /// Begin serving the category the navigational state remembers.
    pub fn start(&self) {
        let state = self.inner.nav.read();
        {
            let mut restore = self.inner.restore.lock().expect("lock poisoned");
            restore.saved_offset =
                (state.scroll_position > 0.0).then_some(state.scroll_position);
            restore.location_pending = true;
            restore.scroll_to_top = false;
        }
        info!(
            category = %state.selected_category,
            page = state.current_page,
            "catalog controller started"
        );
        self.activate(state.selected_category);
    }

    /// Stop the active feed. Idempotent.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.active.lock().expect("lock poisoned").take() {
            handle.shutdown();
        }
        debug!("catalog controller shut down");
    }

    // ========================================================================
    // Projections
    // ========================================================================

    /// Snapshot of the raw catalog data.
    #[must_use]
    pub fn data(&self) -> CatalogData {
        self.inner.catalog.borrow().clone()
    }

    /// Watch catalog replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogData> {
        self.inner.catalog.subscribe()
    }

    /// Handle to the shared navigational store.
    #[must_use]
    pub fn nav(&self) -> NavStore {
        self.inner.nav.clone()
    }

    /// Project the current page of the filtered catalog.
    ///
    /// Pricing is resolved on every read; nothing here is cached or
    /// written back, so a stale stored page silently projects as the
    /// nearest valid one.
    #[must_use]
    pub fn page(&self) -> CatalogPage {
        let data = self.inner.catalog.borrow().clone();
        let state = self.inner.nav.read();

        let filtered = filter_products(&data.products, state.selected_category, &state.search);
        let total_matches = filtered.len();
        let total = total_pages(total_matches);
        let current = clamp_page(state.current_page, total);

        let products = filtered
            .into_iter()
            .skip(page_start(current))
            .take(PAGE_SIZE)
            .map(|product| ListedProduct {
                price: PriceInfo::resolve(product, &[]),
                product: product.clone(),
            })
            .collect();

        CatalogPage {
            products,
            loading: data.loading,
            current_page: current,
            total_pages: total,
            total_matches,
            category: state.selected_category,
            search: state.search,
        }
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Switch category: reset to page one and swap the backing feed.
    pub fn set_category(&self, category: Category) {
        if self.inner.nav.read().selected_category == category {
            return;
        }
        info!(category = %category, "category selected");
        self.inner.nav.update(NavPatch {
            selected_category: Some(category),
            current_page: Some(1),
            ..NavPatch::default()
        });
        self.activate(category);
    }

    /// Record a keystroke in the search box. Nothing refilters.
    pub fn set_search_input(&self, input: impl Into<String>) {
        self.inner.nav.update(NavPatch {
            search_input: Some(input.into()),
            ..NavPatch::default()
        });
    }

    /// Commit the drafted search text and reset to page one.
    pub fn submit_search(&self) {
        let draft = self.inner.nav.read().search_input;
        debug!(search = %draft, "search submitted");
        self.inner.nav.update(NavPatch {
            search: Some(draft),
            current_page: Some(1),
            ..NavPatch::default()
        });
    }

    /// Move to a page, clamped into the valid range.
    pub fn set_page(&self, page: u32) {
        let data = self.inner.catalog.borrow().clone();
        let state = self.inner.nav.read();
        let total = total_pages(
            filter_products(&data.products, state.selected_category, &state.search).len(),
        );
        let clamped = clamp_page(page, total);
        if clamped != page {
            debug!(requested = page, clamped, "page clamped");
        }
        self.inner.nav.update(NavPatch {
            current_page: Some(clamped),
            ..NavPatch::default()
        });
    }

    /// Select a product and resolve its detail view.
    ///
    /// The selection opens (and is mirrored into the location) even when
    /// the detail fetch fails; the dialog presents its own failure state.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn open_product(&self, id: ProductId) -> crate::Result<ProductView> {
        let category = self.inner.nav.read().selected_category;
        self.inner.nav.update(NavPatch {
            selected_product_id: Some(Some(id.clone())),
            detail_dialog_open: Some(true),
            ..NavPatch::default()
        });

        match self.cached_detail(category, &id).await {
            Ok(detail) => Ok(ProductView {
                price: PriceInfo::resolve(&detail.product, &detail.variants),
                detail,
            }),
            Err(error) => {
                warn!(error = %error, "product detail unavailable");
                Err(error.into())
            }
        }
    }

    /// Close the detail view and clear the selection.
    pub fn close_product(&self) {
        self.inner.nav.update(NavPatch {
            selected_product_id: Some(None),
            detail_dialog_open: Some(false),
            ..NavPatch::default()
        });
    }

    /// Record a scroll offset. Writes are coalesced to frame granularity;
    /// only the newest offset within a frame reaches the store.
    pub fn record_scroll(&self, offset: f64) {
        *self.inner.scroll.pending.lock().expect("lock poisoned") = Some(offset);
        if self.inner.scroll.flushing.swap(true, Ordering::AcqRel) {
            return;
        }

        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(SCROLL_FLUSH_INTERVAL).await;
            let Some(inner) = inner.upgrade() else { return };
            inner.scroll.flushing.store(false, Ordering::Release);
            let offset = inner.scroll.pending.lock().expect("lock poisoned").take();
            if let Some(offset) = offset {
                inner.nav.update(NavPatch {
                    scroll_position: Some(offset),
                    ..NavPatch::default()
                });
            }
        });
    }

    /// Take the pending scroll restoration, if the view is ready for one.
    ///
    /// Returns `None` while the first update is still outstanding, because
    /// a product restoration may yet claim precedence over the saved
    /// offset. Each restoration is handed out exactly once.
    pub fn take_scroll_restore(&self) -> Option<ScrollRestore> {
        let mut restore = self.inner.restore.lock().expect("lock poisoned");
        if restore.scroll_to_top {
            restore.scroll_to_top = false;
            return Some(ScrollRestore::Top);
        }
        if restore.location_pending {
            return None;
        }
        restore.saved_offset.take().map(ScrollRestore::Offset)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Tear down the previous activation and spawn the new one.
    fn activate(&self, category: Category) {
        self.inner.catalog.send_modify(|data| data.loading = true);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = feed::activate(category, &self.inner.sources, tx);
        let cancel = handle.token();
        // Replacing the handle cancels the old feed's tasks; an in-flight
        // fetch from the old category lands in a closed channel.
        *self.inner.active.lock().expect("lock poisoned") = Some(handle);

        tokio::spawn(apply_updates(Arc::downgrade(&self.inner), rx, cancel));
    }

    async fn cached_detail(
        &self,
        category: Category,
        id: &ProductId,
    ) -> Result<ProductDetail, SourceError> {
        let key = (category, id.clone());
        if let Some(detail) = self.inner.details.get(&key).await {
            debug!(product_id = %id, "detail cache hit");
            return Ok(detail);
        }

        let raw = self.inner.sources.products.product_detail(id).await?;
        let detail = mapper::map_detail(raw, category);
        self.inner.details.insert(key, detail.clone()).await;
        Ok(detail)
    }
}

impl ControllerInner {
    /// Apply one feed update. Updates land in channel arrival order, which
    /// is the only ordering the catalog guarantees: a slow earlier fetch
    /// that resolves after a newer one overwrites it, wholesale.
    fn apply_update(&self, update: FeedUpdate) {
        match update {
            FeedUpdate::Replace { category, products } => {
                info!(category = %category, count = products.len(), "catalog replaced");
                self.details.invalidate_all();
                self.catalog.send_replace(CatalogData {
                    products,
                    loading: false,
                });
            }
            FeedUpdate::FetchFailed { category, error } => {
                warn!(
                    category = %category,
                    error = %error,
                    "catalog fetch failed; presenting empty list"
                );
                self.catalog.send_replace(CatalogData {
                    products: Vec::new(),
                    loading: false,
                });
            }
        }
        self.finish_first_arrival();
    }

    /// After the first update settles, try the location restore and decide
    /// which scroll restoration the shell gets.
    fn finish_first_arrival(&self) {
        let mut restore = self.restore.lock().expect("lock poisoned");
        if !restore.location_pending {
            return;
        }
        restore.location_pending = false;

        let products = self.catalog.borrow().products.clone();
        let restored = self
            .nav
            .restore_from_location(|id| products.iter().any(|product| product.id == *id));
        if restored.is_some() {
            restore.saved_offset = None;
            restore.scroll_to_top = true;
        }
    }
}

async fn apply_updates(
    inner: Weak<ControllerInner>,
    mut updates: mpsc::UnboundedReceiver<FeedUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            update = updates.recv() => {
                let Some(update) = update else { break };
                let Some(inner) = inner.upgrade() else { break };
                inner.apply_update(update);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str, category: Category) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from(50),
            original_price: Decimal::from(50),
            category,
            image_url: String::new(),
            gallery: Vec::new(),
            is_sold_out: false,
            created_at: chrono::DateTime::UNIX_EPOCH,
            updated_at: chrono::DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        let products = vec![
            product("p1", "Harbor Tee", Category::Apparel),
            product("p2", "Dune Mug", Category::Apparel),
        ];

        let filtered = filter_products(&products, Category::Apparel, "TEE");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_str(), "p1");
    }

    #[test]
    fn test_filter_matches_description() {
        let mut item = product("p1", "Mug", Category::Apparel);
        item.description = "Stoneware with a matte glaze".to_string();
        let products = [item];

        let filtered = filter_products(&products, Category::Apparel, "glaze");

        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filter_respects_category() {
        let products = vec![
            product("p1", "Tee", Category::Apparel),
            product("p2", "Tee Print", Category::Prints),
        ];

        let filtered = filter_products(&products, Category::Prints, "");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_str(), "p2");
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let products = vec![
            product("p1", "A", Category::Apparel),
            product("p2", "B", Category::Apparel),
        ];

        assert_eq!(filter_products(&products, Category::Apparel, "").len(), 2);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(6), 1);
        assert_eq!(total_pages(7), 2);
        assert_eq!(total_pages(12), 2);
        assert_eq!(total_pages(13), 3);
    }

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(9, 2), 2);
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(1, 0), 1);
        assert_eq!(clamp_page(7, 0), 1);
    }

    #[test]
    fn test_page_start_offsets() {
        assert_eq!(page_start(1), 0);
        assert_eq!(page_start(2), 6);
        assert_eq!(page_start(3), 12);
    }
}
