//! Signal-driven feed: refetch the full list on every change signal.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use bayberry_core::Category;

use super::FeedUpdate;
use crate::source::{mapper, ProductSource};

/// Drive the signal feed for one category until cancelled.
///
/// Issues one full fetch on entry, then one per change signal. Signals are
/// never deduplicated and refetches are never sequenced: each runs as its
/// own detached task and lands as its own wholesale replace, so the last
/// response to resolve wins.
pub(super) async fn run(
    category: Category,
    source: Arc<dyn ProductSource>,
    updates: mpsc::UnboundedSender<FeedUpdate>,
    cancel: CancellationToken,
) {
    spawn_fetch(category, &source, &updates);

    let mut changes = match source.subscribe_changes(category).await {
        Ok(stream) => stream,
        Err(error) => {
            // The list already fetched stays on screen; there is no retry.
            error!(
                category = %category,
                error = %error,
                "change subscription failed; live updates disabled"
            );
            cancel.cancelled().await;
            return;
        }
    };

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            signal = changes.next() => match signal {
                Some(_) => {
                    debug!(category = %category, "change signal received");
                    spawn_fetch(category, &source, &updates);
                }
                None => {
                    warn!(
                        category = %category,
                        "change stream closed; live updates stopped"
                    );
                    cancel.cancelled().await;
                    break;
                }
            }
        }
    }

    debug!(category = %category, "signal feed stopped");
}

fn spawn_fetch(
    category: Category,
    source: &Arc<dyn ProductSource>,
    updates: &mpsc::UnboundedSender<FeedUpdate>,
) {
    let source = Arc::clone(source);
    let updates = updates.clone();
    tokio::spawn(async move {
        match source.list_products(category).await {
            Ok(records) => {
                let products = records
                    .into_iter()
                    .map(|record| mapper::map_product(record, category))
                    .collect();
                let _ = updates.send(FeedUpdate::Replace { category, products });
            }
            Err(error) => {
                warn!(category = %category, error = %error, "product list fetch failed");
                let _ = updates.send(FeedUpdate::FetchFailed { category, error });
            }
        }
    });
}
