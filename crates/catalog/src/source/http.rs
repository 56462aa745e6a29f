//! HTTP + SSE implementation of the source boundaries.
//!
//! Lists and details come from JSON REST endpoints; change signals and
//! snapshots arrive over Server-Sent Events. No request carries a
//! timeout: a hung fetch simply never resolves, and the view stays in
//! whatever state it had. Event streams stay open until dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument, warn};

use bayberry_core::{Category, ProductId};

use super::record::{RawProductDetail, RawProductRecord};
use super::sse::{SseDecoder, SseEvent};
use super::{ChangeSignal, ChangeStream, ProductSource, SnapshotSource, SnapshotStream, SourceError};
use crate::config::SourceConfig;

/// HTTP client for the remote catalog.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    inner: Arc<HttpSourceInner>,
}

#[derive(Debug)]
struct HttpSourceInner {
    client: reqwest::Client,
    api_base: String,
    events_base: String,
    api_token: Option<SecretString>,
}

impl HttpCatalogSource {
    /// Create a client for the configured endpoints.
    #[must_use]
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            inner: Arc::new(HttpSourceInner {
                client: reqwest::Client::new(),
                api_base: config.api_url.as_str().trim_end_matches('/').to_string(),
                events_base: config.events_url.as_str().trim_end_matches('/').to_string(),
                api_token: config.api_token.clone(),
            }),
        }
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> Result<T, SourceError> {
        let response = self.request(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %excerpt(&body),
                "catalog API returned error status"
            );
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %excerpt(&body),
                "failed to decode catalog API response"
            );
            SourceError::Decode(e)
        })
    }

    async fn open_event_stream(&self, url: String) -> Result<reqwest::Response, SourceError> {
        let response = self
            .request(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Subscription(format!("HTTP {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl ProductSource for HttpCatalogSource {
    #[instrument(skip(self), fields(category = %category))]
    async fn list_products(
        &self,
        category: Category,
    ) -> Result<Vec<RawProductRecord>, SourceError> {
        let url = format!("{}/categories/{category}/products", self.inner.api_base);
        let records: Vec<RawProductRecord> = self.fetch_json(url).await?;
        info!(count = records.len(), "fetched product list");
        Ok(records)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product_detail(&self, id: &ProductId) -> Result<RawProductDetail, SourceError> {
        let url = format!("{}/products/{}", self.inner.api_base, id);
        match self.fetch_json(url).await {
            Err(SourceError::Status { status: 404, .. }) => {
                Err(SourceError::NotFound(id.to_string()))
            }
            other => other,
        }
    }

    #[instrument(skip(self), fields(category = %category))]
    async fn subscribe_changes(&self, category: Category) -> Result<ChangeStream, SourceError> {
        let url = format!("{}/categories/{category}/events", self.inner.events_base);
        let response = self.open_event_stream(url).await?;
        info!("change subscription opened");

        // Every event on the channel, whatever its name, means the
        // collection changed. Consumers refetch; nothing reads the payload.
        Ok(event_stream(response).map(|_event| ChangeSignal).boxed())
    }
}

#[async_trait]
impl SnapshotSource for HttpCatalogSource {
    #[instrument(skip(self))]
    async fn subscribe_snapshots(&self) -> Result<SnapshotStream, SourceError> {
        let url = format!("{}/snapshots", self.inner.events_base);
        let response = self.open_event_stream(url).await?;
        info!("snapshot subscription opened");

        let snapshots = event_stream(response).filter_map(|event| async move {
            match serde_json::from_str::<Vec<RawProductRecord>>(&event.data) {
                Ok(records) => Some(records),
                Err(e) => {
                    warn!(error = %e, "malformed snapshot payload; skipping delivery");
                    None
                }
            }
        });
        Ok(snapshots.boxed())
    }
}

/// Decode a response body into a stream of SSE events.
///
/// Ends on transport error or upstream close; mid-stream failures are
/// logged here because the consumer only sees the stream end.
fn event_stream(response: reqwest::Response) -> impl Stream<Item = SseEvent> + Send {
    let state = (
        response.bytes_stream(),
        SseDecoder::new(),
        VecDeque::new(),
    );
    futures::stream::unfold(state, |(mut bytes, mut decoder, mut ready)| async move {
        loop {
            if let Some(event) = ready.pop_front() {
                return Some((event, (bytes, decoder, ready)));
            }
            match bytes.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.feed(&chunk)),
                Some(Err(error)) => {
                    warn!(error = %error, "event stream transport error; closing");
                    return None;
                }
                None => return None,
            }
        }
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(500).collect()
}
