//! In-memory stand-ins for the backend and catalog provider

use async_trait::async_trait;
use cinestack_models::{
    CatalogDetails, CatalogItem, CatalogKey, CatalogPage, Episode, MediaType, MovieRecord, NewMovieRecord,
    NewPlaylist, PlaylistDetail, PlaylistItem, PlaylistRecord, SeasonDetail, SeasonSummary, Video, WatchStatus,
};
use cinestack_sources::{ApiError, CatalogProvider, MovieStore, PlaylistBackend};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const PER_PAGE: u64 = 3;

fn not_found() -> ApiError {
    ApiError::ClientError { status: 404, body: "Not found.".to_string() }
}

fn unavailable() -> ApiError {
    ApiError::ServerError { status: 503, body: "catalog down".to_string() }
}

/// Holds each call until the test releases a permit
async fn pass(gate: &Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

pub struct FakeCatalog {
    pub detail_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub season_calls: AtomicUsize,
    pub total_pages: u32,
    pub fail_details: AtomicBool,
    pub fail_pages: AtomicBool,
    missing: HashSet<u64>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeCatalog {
    pub fn new(total_pages: u32) -> Self {
        Self {
            detail_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            season_calls: AtomicUsize::new(0),
            total_pages,
            fail_details: AtomicBool::new(false),
            fail_pages: AtomicBool::new(false),
            missing: HashSet::new(),
            gate: None,
        }
    }

    /// Every call waits for a permit on the returned semaphore
    pub fn gated(total_pages: u32) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let catalog = Self { gate: Some(gate.clone()), ..Self::new(total_pages) };
        (catalog, gate)
    }

    pub fn with_missing(mut self, external_id: u64) -> Self {
        self.missing.insert(external_id);
        self
    }

    pub fn details_called(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn pages_called(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    async fn page(&self, label: &str, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.gate).await;
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let results = (0..PER_PAGE)
            .map(|i| item(u64::from(page) * 100 + i, media_type, &format!("{} {}.{}", label, page, i)))
            .collect();
        Ok(CatalogPage {
            page,
            total_pages: self.total_pages,
            total_results: self.total_pages * PER_PAGE as u32,
            results,
        })
    }
}

pub fn item(external_id: u64, media_type: MediaType, title: &str) -> CatalogItem {
    CatalogItem {
        external_id,
        media_type,
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", external_id)),
        backdrop_path: None,
        overview: String::new(),
        release_date: Some("1999-03-31".to_string()),
        vote_average: Some(8.2),
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn search(&self, query: &str, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
        self.page(query, media_type, page).await
    }

    async fn popular(&self, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
        self.page("popular", media_type, page).await
    }

    async fn details(&self, key: CatalogKey) -> Result<CatalogDetails, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.gate).await;
        if self.missing.contains(&key.external_id) {
            return Err(not_found());
        }
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(CatalogDetails {
            item: item(key.external_id, key.media_type, &format!("Title {}", key.external_id)),
            genres: Vec::new(),
            runtime: Some(136),
            seasons: match key.media_type {
                MediaType::Movie => Vec::new(),
                MediaType::Series => (0..=SEASONS).map(season_summary).collect(),
            },
            videos: vec![Video {
                key: format!("trailer{}", key.external_id),
                site: "YouTube".to_string(),
                video_type: "Trailer".to_string(),
            }],
        })
    }

    async fn season(&self, external_id: u64, season_number: u32) -> Result<SeasonDetail, ApiError> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.gate).await;
        if self.missing.contains(&external_id) || season_number > SEASONS {
            return Err(not_found());
        }
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let summary = season_summary(season_number);
        let episodes = (1..=summary.episode_count)
            .map(|n| Episode {
                episode_number: n,
                name: format!("S{}E{}", season_number, n),
                overview: String::new(),
                air_date: None,
                runtime: Some(45),
                still_path: None,
                vote_average: None,
            })
            .collect();
        Ok(SeasonDetail {
            season_number,
            name: summary.name,
            overview: String::new(),
            air_date: None,
            episodes,
        })
    }
}

/// Series in the fake catalog have specials (season 0) plus this many regular seasons
pub const SEASONS: u32 = 2;

fn season_summary(season_number: u32) -> SeasonSummary {
    SeasonSummary {
        season_number,
        name: if season_number == 0 { "Specials".to_string() } else { format!("Season {}", season_number) },
        episode_count: season_number + 2,
        air_date: None,
    }
}

#[derive(Default)]
pub struct FakeMovieStore {
    pub records: Mutex<HashMap<CatalogKey, MovieRecord>>,
    pub calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    /// Answer with a 400 validation failure
    pub reject_writes: AtomicBool,
    /// Behave like an unreachable backend
    pub down: AtomicBool,
    next_id: AtomicU64,
}

impl FakeMovieStore {
    pub fn created(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn called(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seed(&self, record: MovieRecord) {
        self.records.lock().unwrap().insert(record.key(), record);
    }
}

#[async_trait]
impl MovieStore for FakeMovieStore {
    async fn get_or_create(&self, record: &NewMovieRecord) -> Result<MovieRecord, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkUnavailable("connection refused".to_string()));
        }
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(ApiError::ClientError { status: 400, body: "title: may not be blank".to_string() });
        }
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.get(&record.key()) {
            return Ok(existing.clone());
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = record.clone().into_record(id);
        records.insert(created.key(), created.clone());
        Ok(created)
    }
}

/// Server-side playlist state; counts are always derived from its items
#[derive(Default)]
pub struct FakePlaylistBackend {
    playlists: Mutex<BTreeMap<u64, (PlaylistRecord, BTreeMap<u64, PlaylistItem>)>>,
    pub detail_calls: AtomicUsize,
    pub mutation_calls: AtomicUsize,
    pub fail_mutations: AtomicBool,
    /// Report a wrong `movie_count` on reads
    pub skew_counts: AtomicBool,
    next_id: AtomicU64,
}

impl FakePlaylistBackend {
    pub fn with_playlist(self, id: u64, title: &str) -> Self {
        self.insert_playlist(id, title);
        self
    }

    pub fn insert_playlist(&self, id: u64, title: &str) {
        let record = PlaylistRecord {
            id,
            title: title.to_string(),
            description: String::new(),
            movie_count: 0,
            watched_count: 0,
        };
        self.playlists.lock().unwrap().insert(id, (record, BTreeMap::new()));
        self.next_id.fetch_max(id, Ordering::SeqCst);
    }

    /// Change server state behind the store's back
    pub fn insert_item_directly(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) {
        if let Some((_, items)) = self.playlists.lock().unwrap().get_mut(&playlist_id) {
            items.insert(movie_id, PlaylistItem::new(movie_id, status));
        }
    }

    pub fn server_counts(&self, playlist_id: u64) -> Option<(u32, u32)> {
        self.playlists
            .lock()
            .unwrap()
            .get(&playlist_id)
            .map(|(_, items)| counts(items))
    }

    pub fn mutations(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    fn record(&self, record: &PlaylistRecord, items: &BTreeMap<u64, PlaylistItem>) -> PlaylistRecord {
        let (movie_count, watched_count) = counts(items);
        let skew = if self.skew_counts.load(Ordering::SeqCst) { 5 } else { 0 };
        PlaylistRecord { movie_count: movie_count + skew, watched_count, ..record.clone() }
    }

    async fn mutate<F>(&self, playlist_id: u64, apply: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut BTreeMap<u64, PlaylistItem>) -> Result<(), ApiError>,
    {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkUnavailable("connection reset".to_string()));
        }
        let mut playlists = self.playlists.lock().unwrap();
        let (_, items) = playlists.get_mut(&playlist_id).ok_or_else(not_found)?;
        apply(items)
    }
}

fn counts(items: &BTreeMap<u64, PlaylistItem>) -> (u32, u32) {
    let watched = items.values().filter(|i| i.status.is_watched()).count();
    (items.len() as u32, watched as u32)
}

#[async_trait]
impl PlaylistBackend for FakePlaylistBackend {
    async fn list_playlists(&self) -> Result<Vec<PlaylistRecord>, ApiError> {
        let playlists = self.playlists.lock().unwrap();
        Ok(playlists.values().map(|(r, items)| self.record(r, items)).collect())
    }

    async fn get_playlist(&self, playlist_id: u64) -> Result<PlaylistDetail, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let playlists = self.playlists.lock().unwrap();
        let (record, items) = playlists.get(&playlist_id).ok_or_else(not_found)?;
        Ok(PlaylistDetail {
            record: self.record(record, items),
            items: items.values().cloned().collect(),
        })
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<PlaylistRecord, ApiError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = PlaylistRecord {
            id,
            title: playlist.title.clone(),
            description: playlist.description.clone(),
            movie_count: 0,
            watched_count: 0,
        };
        self.playlists.lock().unwrap().insert(id, (record.clone(), BTreeMap::new()));
        Ok(record)
    }

    async fn delete_playlist(&self, playlist_id: u64) -> Result<(), ApiError> {
        self.playlists
            .lock()
            .unwrap()
            .remove(&playlist_id)
            .map(|_| ())
            .ok_or_else(not_found)
    }

    async fn add_item(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
        self.mutate(playlist_id, |items| {
            if items.contains_key(&movie_id) {
                return Err(ApiError::ClientError { status: 400, body: "Already Added".to_string() });
            }
            items.insert(movie_id, PlaylistItem::new(movie_id, status));
            Ok(())
        })
        .await
    }

    async fn update_item_status(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
        self.mutate(playlist_id, |items| {
            let item = items.get_mut(&movie_id).ok_or_else(not_found)?;
            item.status = status;
            Ok(())
        })
        .await
    }

    async fn remove_item(&self, playlist_id: u64, movie_id: u64) -> Result<(), ApiError> {
        self.mutate(playlist_id, |items| items.remove(&movie_id).map(|_| ()).ok_or_else(not_found))
            .await
    }
}
