//! Durable navigational state with location projection.
//!
//! One store owns the user's browsing context: page, category, search,
//! scroll, and selection. Every mutation flows through [`NavStore::update`]
//! as a partial patch against the full record; the merged result is
//! persisted, published to watchers as a whole-object replacement, and
//! mirrored into the address bar. Reads of the location happen exactly
//! once, at load time, through [`NavStore::restore_from_location`].

pub mod location;
pub mod storage;

pub use location::{HistoryStack, LocationBoundary};
pub use storage::{FileStorage, MemoryStorage, StateStorage};

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use bayberry_core::{Category, ProductId};

/// The user's browsing context within the catalog.
///
/// Unknown stored fields are ignored and missing ones take defaults, so a
/// record written by any prior version of the crate still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavState {
    /// 1-based page within the filtered list.
    pub current_page: u32,
    pub selected_category: Category,
    /// Committed filter text. Changes only on explicit submission.
    pub search: String,
    /// Uncommitted draft. Keystrokes land here without refiltering.
    pub search_input: String,
    /// Saved scroll offset in pixels.
    pub scroll_position: f64,
    pub selected_product_id: Option<ProductId>,
    pub detail_dialog_open: bool,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            current_page: 1,
            selected_category: Category::default(),
            search: String::new(),
            search_input: String::new(),
            scroll_position: 0.0,
            selected_product_id: None,
            detail_dialog_open: false,
        }
    }
}

/// A partial update to [`NavState`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NavPatch {
    pub current_page: Option<u32>,
    pub selected_category: Option<Category>,
    pub search: Option<String>,
    pub search_input: Option<String>,
    pub scroll_position: Option<f64>,
    /// `Some(None)` clears the selection; `None` leaves it untouched.
    pub selected_product_id: Option<Option<ProductId>>,
    pub detail_dialog_open: Option<bool>,
}

impl NavPatch {
    fn apply(self, state: &mut NavState) {
        if let Some(page) = self.current_page {
            state.current_page = page;
        }
        if let Some(category) = self.selected_category {
            state.selected_category = category;
        }
        if let Some(search) = self.search {
            state.search = search;
        }
        if let Some(input) = self.search_input {
            state.search_input = input;
        }
        if let Some(scroll) = self.scroll_position {
            state.scroll_position = scroll;
        }
        if let Some(selection) = self.selected_product_id {
            state.selected_product_id = selection;
        }
        if let Some(open) = self.detail_dialog_open {
            state.detail_dialog_open = open;
        }
    }
}

/// Durable, address-mirrored store of the navigational state.
///
/// Cheap to clone; all clones share state. Rehydrates from storage at
/// construction, substituting defaults when no usable record exists.
#[derive(Clone)]
pub struct NavStore {
    inner: Arc<NavStoreInner>,
}

struct NavStoreInner {
    storage: Box<dyn StateStorage>,
    location: Option<Arc<dyn LocationBoundary>>,
    state: watch::Sender<NavState>,
    /// Serializes read-modify-write cycles.
    write: Mutex<()>,
}

impl NavStore {
    /// Create a store backed by `storage`, optionally mirroring the
    /// selection into `location`.
    #[must_use]
    pub fn new(
        storage: Box<dyn StateStorage>,
        location: Option<Arc<dyn LocationBoundary>>,
    ) -> Self {
        let initial = storage.load().unwrap_or_default();
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(NavStoreInner {
                storage,
                location,
                state,
                write: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn read(&self) -> NavState {
        self.inner.state.borrow().clone()
    }

    /// Watch for whole-state replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavState> {
        self.inner.state.subscribe()
    }

    /// Merge a patch, persist the result, publish it, mirror the selection.
    ///
    /// Opening or closing a selection pushes a new history entry so a
    /// platform back action undoes it; moving between two products
    /// replaces the current entry instead.
    pub fn update(&self, patch: NavPatch) -> NavState {
        self.apply(patch, true)
    }

    /// Reset to defaults and delete the persisted record.
    pub fn clear(&self) {
        let _guard = self.inner.write.lock().expect("lock poisoned");
        let previous = self.inner.state.borrow().clone();
        let next = NavState::default();
        self.project_selection(&previous, &next);
        self.inner.state.send_replace(next);
        if let Err(e) = self.inner.storage.remove() {
            warn!(error = %e, "failed to remove persisted state");
        }
        info!("navigational state cleared");
    }

    /// Reopen the product named by the location's `id` parameter.
    ///
    /// Called once the catalog has loaded. When the id is known the dialog
    /// reopens and the view scrolls to the top; product restoration takes
    /// precedence over any saved scroll offset. No history entry is pushed
    /// because the current entry already carries the id.
    pub fn restore_from_location(
        &self,
        is_known: impl Fn(&ProductId) -> bool,
    ) -> Option<ProductId> {
        let location = self.inner.location.as_ref()?;
        let id = location::selection_from_query(&location.current_query())?;
        if !is_known(&id) {
            debug!(product_id = %id, "location names an unknown product; ignoring");
            return None;
        }

        self.apply(
            NavPatch {
                selected_product_id: Some(Some(id.clone())),
                detail_dialog_open: Some(true),
                scroll_position: Some(0.0),
                ..NavPatch::default()
            },
            false,
        );
        info!(product_id = %id, "restored selection from location");
        Some(id)
    }

    /// The one code path every mutation takes.
    fn apply(&self, patch: NavPatch, project: bool) -> NavState {
        let _guard = self.inner.write.lock().expect("lock poisoned");
        let previous = self.inner.state.borrow().clone();
        let mut next = previous.clone();
        patch.apply(&mut next);

        if project {
            self.project_selection(&previous, &next);
        }
        self.inner.state.send_replace(next.clone());
        if let Err(e) = self.inner.storage.save(&next) {
            warn!(error = %e, "failed to persist navigational state");
        }
        next
    }

    /// One-way, best-effort mirror of the selection into the address bar.
    fn project_selection(&self, previous: &NavState, next: &NavState) {
        let Some(location) = &self.inner.location else {
            return;
        };
        if previous.selected_product_id == next.selected_product_id {
            return;
        }

        let query = location::query_with_selection(
            &location.current_query(),
            next.selected_product_id.as_ref(),
        );
        let was_open = previous.selected_product_id.is_some();
        let is_open = next.selected_product_id.is_some();
        if was_open == is_open {
            location.replace(query);
        } else {
            location.push(query);
        }
    }
}
