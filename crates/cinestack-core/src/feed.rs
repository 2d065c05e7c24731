use cinestack_models::{CatalogItem, CatalogPage, MediaType};
use cinestack_sources::{ApiError, CatalogProvider};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use crate::error::CineError;

/// Well-known stream keys
pub mod keys {
    pub const SEARCH: &str = "search";
    pub const POPULAR_MOVIES: &str = "popularMovies";
    pub const POPULAR_SERIES: &str = "popularSeries";
}

/// What a stream pages through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    Search { query: String, media_type: MediaType },
    Popular { media_type: MediaType },
}

impl FeedQuery {
    pub fn search(query: impl Into<String>, media_type: MediaType) -> Self {
        FeedQuery::Search { query: query.into(), media_type }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            FeedQuery::Search { media_type, .. } | FeedQuery::Popular { media_type } => *media_type,
        }
    }

    /// Default query for a well-known category key
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            keys::POPULAR_MOVIES => Some(FeedQuery::Popular { media_type: MediaType::Movie }),
            keys::POPULAR_SERIES => Some(FeedQuery::Popular { media_type: MediaType::Series }),
            _ => None,
        }
    }

    /// A blank search has nothing to page through
    fn is_blank(&self) -> bool {
        matches!(self, FeedQuery::Search { query, .. } if query.trim().is_empty())
    }

    async fn fetch(&self, provider: &dyn CatalogProvider, page: u32) -> Result<CatalogPage, ApiError> {
        match self {
            FeedQuery::Search { query, media_type } => provider.search(query.trim(), *media_type, page).await,
            FeedQuery::Popular { media_type } => provider.popular(*media_type, page).await,
        }
    }
}

/// One independently paginated accumulation of catalog items
#[derive(Debug, Clone, PartialEq)]
pub struct FeedStream {
    pub key: String,
    pub query: FeedQuery,
    /// In arrival order, never deduplicated across pages
    pub items: Vec<CatalogItem>,
    /// Next page to request
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    /// Bumped on every reset; responses from an older generation are dropped
    pub generation: u64,
    pub error: Option<String>,
    pub total_results: u32,
}

impl FeedStream {
    fn new(key: &str, query: FeedQuery, generation: u64) -> Self {
        let has_more = !query.is_blank();
        Self {
            key: key.to_string(),
            query,
            items: Vec::new(),
            page: 1,
            has_more,
            loading: false,
            generation,
            error: None,
            total_results: 0,
        }
    }

    fn reset(&mut self, query: FeedQuery, generation: u64) {
        self.has_more = !query.is_blank();
        self.query = query;
        self.items.clear();
        self.page = 1;
        self.loading = false;
        self.generation = generation;
        self.error = None;
        self.total_results = 0;
    }
}

/// Result of one `fetch_next` call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// `count` items from `page` were appended
    Loaded { page: u32, count: usize },
    /// Already loading or exhausted; nothing was requested
    Skipped,
    /// The stream was reset or removed while the request was out
    Discarded,
    Failed(CineError),
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded { .. })
    }
}

struct FeedInner {
    provider: Arc<dyn CatalogProvider>,
    /// Never held across an await
    streams: Mutex<HashMap<String, FeedStream>>,
    /// Shared so a removed and recreated key never reuses a generation
    generations: AtomicU64,
}

impl FeedInner {
    fn lock_streams(&self) -> MutexGuard<'_, HashMap<String, FeedStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases a stream's `loading` flag if the fetch holding it is dropped before
/// its response arrives (caller timeout, aborted task).
struct LoadingGuard<'a> {
    inner: &'a FeedInner,
    key: &'a str,
    generation: u64,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut streams = self.inner.lock_streams();
        if let Some(stream) = streams.get_mut(self.key) {
            if stream.generation == self.generation && stream.loading {
                stream.loading = false;
                debug!("Feed '{}' fetch abandoned at generation {}", self.key, self.generation);
            }
        }
    }
}

/// Named result streams (a search, category listings) paged independently.
///
/// At most one page request is out per stream; a request abandoned by its
/// caller frees the stream for the next one. Streams never affect each other;
/// their state lives until reset or removed.
#[derive(Clone)]
pub struct FeedAggregator {
    inner: Arc<FeedInner>,
}

impl FeedAggregator {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                provider,
                streams: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Clear the stream and point it at `query`, creating it if needed.
    /// Invalidates any request still out for the previous generation.
    pub async fn reset_stream(&self, key: &str, query: FeedQuery) -> u64 {
        let mut streams = self.inner.lock_streams();
        let generation = self.inner.generations.fetch_add(1, Ordering::SeqCst);
        match streams.get_mut(key) {
            Some(stream) => {
                stream.reset(query, generation);
                debug!("Reset feed '{}' to generation {}", key, generation);
            }
            None => {
                debug!("Created feed '{}' at generation {}", key, generation);
                streams.insert(key.to_string(), FeedStream::new(key, query, generation));
            }
        }
        generation
    }

    /// Request the next page of `key` and append it
    pub async fn fetch_next(&self, key: &str) -> FetchOutcome {
        let (query, page, generation) = {
            let mut streams = self.inner.lock_streams();
            let Some(stream) = streams.get_mut(key) else {
                return FetchOutcome::Failed(CineError::NotFound(format!("feed '{}'", key)));
            };
            if stream.loading || !stream.has_more {
                return FetchOutcome::Skipped;
            }
            stream.loading = true;
            (stream.query.clone(), stream.page, stream.generation)
        };

        let mut guard = LoadingGuard { inner: self.inner.as_ref(), key, generation, armed: true };
        let result = query.fetch(self.inner.provider.as_ref(), page).await;
        guard.disarm();
        drop(guard);

        let mut streams = self.inner.lock_streams();
        let Some(stream) = streams.get_mut(key) else {
            debug!("Feed '{}' was removed while page {} was loading", key, page);
            return FetchOutcome::Discarded;
        };
        if stream.generation != generation {
            debug!(
                "Discarding page {} of feed '{}' from generation {} (now {})",
                page, key, generation, stream.generation
            );
            return FetchOutcome::Discarded;
        }

        stream.loading = false;
        match result {
            Ok(response) => {
                let count = response.results.len();
                stream.has_more = response.has_more();
                stream.total_results = response.total_results;
                stream.items.extend(response.results);
                stream.page = page + 1;
                stream.error = None;
                debug!(
                    "Feed '{}' page {}: +{} items ({} total, more: {})",
                    key, page, count, stream.items.len(), stream.has_more
                );
                FetchOutcome::Loaded { page, count }
            }
            Err(e) => {
                let err = CineError::from_listing(e);
                warn!("Feed '{}' page {} failed: {}", key, page, err);
                stream.has_more = false;
                stream.error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Reset `key` with its current query and load the first page again
    pub async fn refresh(&self, key: &str) -> FetchOutcome {
        let query = {
            let streams = self.inner.lock_streams();
            match streams.get(key) {
                Some(stream) => stream.query.clone(),
                None => return FetchOutcome::Failed(CineError::NotFound(format!("feed '{}'", key))),
            }
        };
        self.reset_stream(key, query).await;
        self.fetch_next(key).await
    }

    /// Refresh every stream concurrently
    pub async fn refresh_all(&self) -> Vec<(String, FetchOutcome)> {
        let keys = self.stream_keys().await;
        let outcomes = join_all(keys.iter().map(|key| self.refresh(key))).await;
        let loaded = outcomes.iter().filter(|o| o.is_loaded()).count();
        info!("Refreshed {} of {} feeds", loaded, keys.len());
        keys.into_iter().zip(outcomes).collect()
    }

    pub async fn snapshot(&self, key: &str) -> Option<FeedStream> {
        self.inner.lock_streams().get(key).cloned()
    }

    pub async fn items(&self, key: &str) -> Vec<CatalogItem> {
        self.inner
            .lock_streams()
            .get(key)
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }

    /// Drop the stream; a request still out for it is discarded on arrival
    pub async fn remove_stream(&self, key: &str) -> bool {
        self.inner.lock_streams().remove(key).is_some()
    }

    pub async fn stream_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock_streams().keys().cloned().collect();
        keys.sort();
        keys
    }
}
