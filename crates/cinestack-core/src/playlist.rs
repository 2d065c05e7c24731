use cinestack_models::{MovieRecord, NewPlaylist, PlaylistDetail, PlaylistItem, PlaylistRecord, WatchStatus};
use cinestack_sources::PlaylistBackend;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::error::CineError;

/// A playlist whose items are known; counts are derived from `items`
struct LoadedPlaylist {
    record: PlaylistRecord,
    items: BTreeMap<u64, PlaylistItem>,
}

impl LoadedPlaylist {
    fn empty(record: PlaylistRecord) -> Self {
        let mut loaded = Self { record, items: BTreeMap::new() };
        loaded.recount();
        loaded
    }

    fn from_detail(detail: PlaylistDetail) -> Self {
        let mut items = BTreeMap::new();
        for item in detail.items {
            if items.contains_key(&item.movie_id) {
                warn!("Playlist {} lists movie {} twice, keeping the first", detail.record.id, item.movie_id);
                continue;
            }
            items.insert(item.movie_id, item);
        }
        let reported = (detail.record.movie_count, detail.record.watched_count);
        let mut loaded = Self { record: detail.record, items };
        loaded.recount();
        if reported != (loaded.record.movie_count, loaded.record.watched_count) {
            warn!(
                "Playlist {} reported {}/{} watched but its items give {}/{}",
                loaded.record.id,
                reported.1,
                reported.0,
                loaded.record.watched_count,
                loaded.record.movie_count
            );
        }
        loaded
    }

    fn recount(&mut self) {
        self.record.movie_count = self.items.len() as u32;
        self.record.watched_count = self.items.values().filter(|i| i.status.is_watched()).count() as u32;
    }

    fn to_detail(&self) -> PlaylistDetail {
        let mut items: Vec<PlaylistItem> = self.items.values().cloned().collect();
        items.sort_by_key(|i| (i.added_at, i.movie_id));
        PlaylistDetail { record: self.record.clone(), items }
    }
}

#[derive(Default)]
struct PlaylistState {
    /// Last known summary, from the list endpoint or our own mutations
    summary: Option<PlaylistRecord>,
    loaded: Option<LoadedPlaylist>,
}

impl PlaylistState {
    /// Make `record` the summary callers see
    fn publish(&mut self, record: PlaylistRecord) -> PlaylistRecord {
        debug_assert!(record.watched_count <= record.movie_count);
        self.summary = Some(record.clone());
        record
    }

    /// Server disagreed with what we hold; reload before the next mutation
    fn invalidate(&mut self) {
        self.loaded = None;
    }
}

type Slot = Arc<Mutex<PlaylistState>>;

struct StoreInner {
    backend: Arc<dyn PlaylistBackend>,
    /// Never locked while a slot lock is held
    slots: Mutex<HashMap<u64, Slot>>,
}

/// Playlists, their items, and the watched/total counters derived from them.
///
/// Every mutation on a playlist holds that playlist's lock across the backend call,
/// so concurrent add/update/remove calls cannot lose a count update. Different
/// playlists never contend.
#[derive(Clone)]
pub struct PlaylistStore {
    inner: Arc<StoreInner>,
}

impl PlaylistStore {
    pub fn new(backend: Arc<dyn PlaylistBackend>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    async fn slot(&self, playlist_id: u64) -> Slot {
        let mut slots = self.inner.slots.lock().await;
        slots.entry(playlist_id).or_default().clone()
    }

    async fn all_slots(&self) -> Vec<Slot> {
        self.inner.slots.lock().await.values().cloned().collect()
    }

    async fn ensure_loaded<'a>(&self, playlist_id: u64, state: &'a mut PlaylistState) -> Result<&'a mut LoadedPlaylist, CineError> {
        let loaded = match state.loaded.take() {
            Some(loaded) => loaded,
            None => {
                let detail = self.inner.backend.get_playlist(playlist_id).await?;
                debug!("Loaded playlist {} with {} items", playlist_id, detail.items.len());
                LoadedPlaylist::from_detail(detail)
            }
        };
        Ok(state.loaded.insert(loaded))
    }

    /// Reload the playlist list. Safe to call any number of times.
    pub async fn refresh(&self) -> Result<Vec<PlaylistRecord>, CineError> {
        let records = self.inner.backend.list_playlists().await?;
        let live: Vec<u64> = records.iter().map(|r| r.id).collect();

        for mut record in records {
            if record.watched_count > record.movie_count {
                warn!(
                    "Playlist {} reported {} watched of {}, capping",
                    record.id, record.watched_count, record.movie_count
                );
                record.watched_count = record.movie_count;
            }
            let slot = self.slot(record.id).await;
            let mut state = slot.lock().await;
            let stale = state.loaded.as_ref().is_some_and(|l| {
                (l.record.movie_count, l.record.watched_count) != (record.movie_count, record.watched_count)
            });
            if stale {
                debug!("Playlist {} changed on the server, dropping loaded items", record.id);
                state.invalidate();
            }
            if let Some(loaded) = state.loaded.as_mut() {
                loaded.record.title = record.title.clone();
                loaded.record.description = record.description.clone();
            }
            state.summary = Some(record);
        }

        self.inner.slots.lock().await.retain(|id, _| live.contains(id));
        info!("Refreshed {} playlists", live.len());
        Ok(self.playlists().await)
    }

    /// Reload one playlist with its items
    pub async fn refresh_playlist(&self, playlist_id: u64) -> Result<PlaylistDetail, CineError> {
        let slot = self.slot(playlist_id).await;
        let mut state = slot.lock().await;
        state.invalidate();
        let detail = self.ensure_loaded(playlist_id, &mut state).await?.to_detail();
        state.publish(detail.record.clone());
        Ok(detail)
    }

    /// Known playlists, ordered by id
    pub async fn playlists(&self) -> Vec<PlaylistRecord> {
        let mut records = Vec::new();
        for slot in self.all_slots().await {
            let state = slot.lock().await;
            if let Some(summary) = &state.summary {
                records.push(summary.clone());
            }
        }
        records.sort_by_key(|r| r.id);
        records
    }

    pub async fn playlist(&self, playlist_id: u64) -> Option<PlaylistRecord> {
        let slot = self.inner.slots.lock().await.get(&playlist_id).cloned()?;
        let state = slot.lock().await;
        state.summary.clone()
    }

    /// Playlist with its items, loading them if needed
    pub async fn detail(&self, playlist_id: u64) -> Result<PlaylistDetail, CineError> {
        let slot = self.slot(playlist_id).await;
        let mut state = slot.lock().await;
        let detail = self.ensure_loaded(playlist_id, &mut state).await?.to_detail();
        state.publish(detail.record.clone());
        Ok(detail)
    }

    pub async fn create_playlist(&self, title: &str, description: &str) -> Result<PlaylistRecord, CineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CineError::ValidationError("playlist title is required".to_string()));
        }
        let request = NewPlaylist {
            title: title.to_string(),
            description: description.trim().to_string(),
        };
        let record = self.inner.backend.create_playlist(&request).await?;
        info!("Created playlist {} '{}'", record.id, record.title);

        let slot = self.slot(record.id).await;
        let mut state = slot.lock().await;
        let loaded = LoadedPlaylist::empty(record);
        let record = loaded.record.clone();
        state.loaded = Some(loaded);
        Ok(state.publish(record))
    }

    pub async fn delete_playlist(&self, playlist_id: u64) -> Result<(), CineError> {
        let slot = self.slot(playlist_id).await;
        {
            let mut state = slot.lock().await;
            self.inner.backend.delete_playlist(playlist_id).await?;
            state.summary = None;
            state.loaded = None;
        }
        self.inner.slots.lock().await.remove(&playlist_id);
        info!("Deleted playlist {}", playlist_id);
        Ok(())
    }

    /// Add a movie by local id. Fails with `DuplicateItem` if it is already there.
    pub async fn add_item(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<PlaylistRecord, CineError> {
        self.insert(playlist_id, PlaylistItem::new(movie_id, status)).await
    }

    /// Add a resolved movie, keeping its metadata on the item
    pub async fn add_movie(&self, playlist_id: u64, movie: &MovieRecord, status: WatchStatus) -> Result<PlaylistRecord, CineError> {
        self.insert(playlist_id, PlaylistItem::for_movie(movie, status)).await
    }

    async fn insert(&self, playlist_id: u64, item: PlaylistItem) -> Result<PlaylistRecord, CineError> {
        let movie_id = item.movie_id;
        let status = item.status;
        let slot = self.slot(playlist_id).await;
        let mut state = slot.lock().await;
        let loaded = self.ensure_loaded(playlist_id, &mut state).await?;
        if loaded.items.contains_key(&movie_id) {
            return Err(CineError::DuplicateItem(format!("movie {} in playlist {}", movie_id, playlist_id)));
        }

        if let Err(e) = self.inner.backend.add_item(playlist_id, movie_id, status).await {
            let err = CineError::from_add_item(e, playlist_id, movie_id);
            if matches!(err, CineError::DuplicateItem(_) | CineError::NotFound(_)) {
                state.invalidate();
            }
            return Err(err);
        }

        loaded.items.insert(movie_id, item);
        loaded.record.movie_count += 1;
        if status.is_watched() {
            loaded.record.watched_count += 1;
        }
        debug!("Added movie {} to playlist {} as {}", movie_id, playlist_id, status);
        let record = loaded.record.clone();
        Ok(state.publish(record))
    }

    /// Set an item's status; `watched_count` moves by the delta against the previous status
    pub async fn update_status(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<PlaylistRecord, CineError> {
        let slot = self.slot(playlist_id).await;
        let mut state = slot.lock().await;
        let loaded = self.ensure_loaded(playlist_id, &mut state).await?;
        let previous = loaded
            .items
            .get(&movie_id)
            .map(|i| i.status)
            .ok_or_else(|| CineError::NotFound(format!("movie {} in playlist {}", movie_id, playlist_id)))?;

        if let Err(e) = self.inner.backend.update_item_status(playlist_id, movie_id, status).await {
            let err = CineError::from(e);
            if matches!(err, CineError::NotFound(_)) {
                state.invalidate();
            }
            return Err(err);
        }

        if let Some(item) = loaded.items.get_mut(&movie_id) {
            item.status = status;
        }
        match (previous.is_watched(), status.is_watched()) {
            (false, true) => loaded.record.watched_count += 1,
            (true, false) => loaded.record.watched_count -= 1,
            _ => {}
        }
        debug!("Movie {} in playlist {}: {} -> {}", movie_id, playlist_id, previous, status);
        let record = loaded.record.clone();
        Ok(state.publish(record))
    }

    /// `update_status` for a status arriving as free text
    pub async fn update_status_str(&self, playlist_id: u64, movie_id: u64, status: &str) -> Result<PlaylistRecord, CineError> {
        let status = status
            .parse::<WatchStatus>()
            .map_err(|e| CineError::ValidationError(e.to_string()))?;
        self.update_status(playlist_id, movie_id, status).await
    }

    pub async fn remove_item(&self, playlist_id: u64, movie_id: u64) -> Result<PlaylistRecord, CineError> {
        let slot = self.slot(playlist_id).await;
        let mut state = slot.lock().await;
        let loaded = self.ensure_loaded(playlist_id, &mut state).await?;
        let was_watched = loaded
            .items
            .get(&movie_id)
            .map(|i| i.status.is_watched())
            .ok_or_else(|| CineError::NotFound(format!("movie {} in playlist {}", movie_id, playlist_id)))?;

        if let Err(e) = self.inner.backend.remove_item(playlist_id, movie_id).await {
            let err = CineError::from(e);
            if matches!(err, CineError::NotFound(_)) {
                state.invalidate();
            }
            return Err(err);
        }

        loaded.items.remove(&movie_id);
        loaded.record.movie_count -= 1;
        if was_watched {
            loaded.record.watched_count -= 1;
        }
        debug!("Removed movie {} from playlist {}", movie_id, playlist_id);
        let record = loaded.record.clone();
        Ok(state.publish(record))
    }

    /// Watched percentage, 0 for an empty playlist
    pub async fn progress(&self, playlist_id: u64) -> Result<u8, CineError> {
        if let Some(record) = self.playlist(playlist_id).await {
            return Ok(record.progress());
        }
        Ok(self.detail(playlist_id).await?.record.progress())
    }
}
