//! Snapshot feed: the source pushes whole collections.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use bayberry_core::Category;

use super::FeedUpdate;
use crate::source::{mapper, SnapshotSource};

/// Drive the snapshot feed for one category until cancelled.
///
/// No initial fetch exists on this transport; the collection stays in its
/// loading state until the first snapshot lands. Every delivery replaces
/// the whole list.
pub(super) async fn run(
    category: Category,
    source: Arc<dyn SnapshotSource>,
    updates: mpsc::UnboundedSender<FeedUpdate>,
    cancel: CancellationToken,
) {
    let mut snapshots = match source.subscribe_snapshots().await {
        Ok(stream) => stream,
        Err(error) => {
            error!(
                category = %category,
                error = %error,
                "snapshot subscription failed; collection will not load"
            );
            cancel.cancelled().await;
            return;
        }
    };

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            delivery = snapshots.next() => match delivery {
                Some(records) => {
                    let products: Vec<_> = records
                        .into_iter()
                        .map(|record| mapper::map_product(record, category))
                        .collect();
                    debug!(
                        category = %category,
                        count = products.len(),
                        "snapshot delivered"
                    );
                    if updates
                        .send(FeedUpdate::Replace { category, products })
                        .is_err()
                    {
                        break;
                    }
                }
                None => {
                    warn!(
                        category = %category,
                        "snapshot stream closed; keeping last collection"
                    );
                    cancel.cancelled().await;
                    break;
                }
            }
        }
    }

    debug!(category = %category, "snapshot feed stopped");
}
