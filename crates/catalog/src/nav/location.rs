//! One-way projection of the selected product into the location.
//!
//! The address bar mirrors the selection so links can be shared and
//! reloads can restore the open product. The mirror is strictly one-way:
//! state drives the location, and the location is only ever read back once
//! at load time.

use std::sync::Mutex;

use url::form_urlencoded;

use bayberry_core::ProductId;

/// Query parameter carrying the selected product.
pub const SELECTION_PARAM: &str = "id";

/// Boundary to the host environment's address bar and history stack.
///
/// The store writes only the selection parameter; every other query
/// parameter belongs to other features and survives untouched.
pub trait LocationBoundary: Send + Sync {
    /// Raw query string of the current entry, without the leading `?`.
    fn current_query(&self) -> String;

    /// Push a new history entry with the given query.
    fn push(&self, query: String);

    /// Replace the current history entry's query.
    fn replace(&self, query: String);
}

/// Extract the selected product id from a raw query string.
#[must_use]
pub fn selection_from_query(query: &str) -> Option<ProductId> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == SELECTION_PARAM)
        .map(|(_, value)| ProductId::new(value.into_owned()))
        .filter(|id| !id.is_empty())
}

/// Rewrite a query string with the given selection, preserving every other
/// parameter.
#[must_use]
pub fn query_with_selection(query: &str, selection: Option<&ProductId>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != SELECTION_PARAM {
            serializer.append_pair(&key, &value);
        }
    }
    if let Some(id) = selection {
        serializer.append_pair(SELECTION_PARAM, id.as_str());
    }
    serializer.finish()
}

/// In-memory history stack, the boundary used by shells and tests.
#[derive(Debug)]
pub struct HistoryStack {
    inner: Mutex<HistoryInner>,
}

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<String>,
    index: usize,
}

impl HistoryStack {
    /// A stack with one empty entry, like a fresh page load.
    #[must_use]
    pub fn new() -> Self {
        Self::with_query("")
    }

    /// A stack whose current entry carries the given query.
    #[must_use]
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![query.into()],
                index: 0,
            }),
        }
    }

    /// Navigate back one entry, returning the query it lands on.
    pub fn back(&self) -> Option<String> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.index == 0 {
            return None;
        }
        inner.index -= 1;
        inner.entries.get(inner.index).cloned()
    }

    /// Number of entries on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.lock().expect("lock poisoned").entries.len()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationBoundary for HistoryStack {
    fn current_query(&self) -> String {
        let inner = self.inner.lock().expect("lock poisoned");
        inner.entries.get(inner.index).cloned().unwrap_or_default()
    }

    fn push(&self, query: String) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        // Pushing discards any forward entries, like a browser would.
        let keep = inner.index + 1;
        inner.entries.truncate(keep);
        inner.entries.push(query);
        inner.index += 1;
    }

    fn replace(&self, query: String) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let index = inner.index;
        if let Some(entry) = inner.entries.get_mut(index) {
            *entry = query;
        }
    }
}
