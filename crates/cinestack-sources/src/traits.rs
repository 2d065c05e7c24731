use async_trait::async_trait;
use cinestack_models::{
    CatalogDetails, CatalogKey, CatalogPage, MediaType, MovieRecord, NewMovieRecord, NewPlaylist,
    PlaylistDetail, PlaylistRecord, SeasonDetail, WatchStatus,
};
use crate::error::ApiError;

/// External catalog of titles (search, category listings, detail lookups)
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn search(&self, query: &str, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError>;

    async fn popular(&self, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError>;

    /// Full metadata for one title; a missing title is `ClientError { status: 404 }`
    async fn details(&self, key: CatalogKey) -> Result<CatalogDetails, ApiError>;

    /// Episode listing for one season of a series
    async fn season(&self, external_id: u64, season_number: u32) -> Result<SeasonDetail, ApiError>;
}

/// Persistence boundary for local movie records
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Return the record stored under `record`'s catalog key, creating it if absent.
    /// Repeating the call for the same key yields the same record.
    async fn get_or_create(&self, record: &NewMovieRecord) -> Result<MovieRecord, ApiError>;
}

/// Persistence boundary for playlists and their items
#[async_trait]
pub trait PlaylistBackend: Send + Sync {
    async fn list_playlists(&self) -> Result<Vec<PlaylistRecord>, ApiError>;

    async fn get_playlist(&self, playlist_id: u64) -> Result<PlaylistDetail, ApiError>;

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<PlaylistRecord, ApiError>;

    async fn delete_playlist(&self, playlist_id: u64) -> Result<(), ApiError>;

    async fn add_item(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError>;

    async fn update_item_status(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError>;

    async fn remove_item(&self, playlist_id: u64, movie_id: u64) -> Result<(), ApiError>;
}
