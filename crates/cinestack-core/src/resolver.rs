use cinestack_models::{CatalogKey, MediaType, MovieRecord, NewMovieRecord};
use cinestack_sources::{CatalogProvider, MovieStore};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::error::CineError;

type PendingResolve = Shared<BoxFuture<'static, Result<MovieRecord, CineError>>>;

#[derive(Default)]
struct ResolverState {
    /// Records already materialized, by catalog key
    records: HashMap<CatalogKey, MovieRecord>,

    /// At most one pending resolution per key; removed once it settles
    in_flight: HashMap<CatalogKey, PendingResolve>,
}

struct ResolverInner {
    provider: Arc<dyn CatalogProvider>,
    store: Arc<dyn MovieStore>,
    state: Mutex<ResolverState>,
}

/// Turns catalog keys into durable local movie records.
///
/// Lookup order is the in-memory index, then the catalog provider followed by
/// the backend's get-or-create, which returns the existing record when another
/// client already persisted the key. Concurrent callers for the same key share
/// a single pending resolution and observe the same outcome. Failures are not
/// remembered, so the next call starts over.
#[derive(Clone)]
pub struct CatalogResolver {
    inner: Arc<ResolverInner>,
}

impl CatalogResolver {
    pub fn new(provider: Arc<dyn CatalogProvider>, store: Arc<dyn MovieStore>) -> Self {
        Self::with_records(provider, store, Vec::new())
    }

    /// Start with records known from a previous run
    pub fn with_records(
        provider: Arc<dyn CatalogProvider>,
        store: Arc<dyn MovieStore>,
        records: Vec<MovieRecord>,
    ) -> Self {
        let records = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            inner: Arc::new(ResolverInner {
                provider,
                store,
                state: Mutex::new(ResolverState { records, in_flight: HashMap::new() }),
            }),
        }
    }

    pub async fn resolve(&self, external_id: u64, media_type: MediaType) -> Result<MovieRecord, CineError> {
        let key = CatalogKey::new(external_id, media_type);
        let pending = {
            let mut state = self.inner.state.lock().await;
            if let Some(record) = state.records.get(&key) {
                debug!("Resolver cache hit for {}", key);
                return Ok(record.clone());
            }
            match state.in_flight.get(&key) {
                Some(pending) => {
                    debug!("Joining in-flight resolution of {}", key);
                    pending.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let pending = async move {
                        let outcome = inner.lookup(key).await;
                        inner.settle(key, &outcome).await;
                        outcome
                    }
                    .boxed()
                    .shared();
                    state.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Record for `key` if it has already been resolved
    pub async fn cached(&self, key: CatalogKey) -> Option<MovieRecord> {
        self.inner.state.lock().await.records.get(&key).cloned()
    }

    /// Every resolved record, ordered by local id
    pub async fn records(&self) -> Vec<MovieRecord> {
        let state = self.inner.state.lock().await;
        let mut records: Vec<MovieRecord> = state.records.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.state.lock().await.in_flight.len()
    }
}

impl ResolverInner {
    async fn lookup(&self, key: CatalogKey) -> Result<MovieRecord, CineError> {
        let details = self
            .provider
            .details(key)
            .await
            .map_err(|e| CineError::from_provider(e, key))?;
        let new_record = NewMovieRecord::from_details(&details);

        let record = self
            .store
            .get_or_create(&new_record)
            .await
            .map_err(CineError::from_persistence)?;
        info!("Resolved {} to movie record {} '{}'", key, record.id, record.title);
        Ok(record)
    }

    /// Publish the outcome and retire the in-flight entry under one lock
    async fn settle(&self, key: CatalogKey, outcome: &Result<MovieRecord, CineError>) {
        let mut state = self.state.lock().await;
        state.in_flight.remove(&key);
        match outcome {
            Ok(record) => {
                state.records.insert(key, record.clone());
            }
            Err(e) => debug!("Resolution of {} failed: {}", key, e),
        }
    }
}
