use async_trait::async_trait;
use cinestack_config::{Config, CredentialStore};
use cinestack_models::{
    CatalogDetails, CatalogKey, CatalogPage, MediaType, MovieRecord, NewMovieRecord, NewPlaylist,
    PlaylistDetail, PlaylistRecord, SeasonDetail, WatchStatus,
};
use tracing::info;
use crate::backend::api;
use crate::error::ApiError;
use crate::session::{SessionClient, SessionContext};
use crate::traits::{CatalogProvider, MovieStore, PlaylistBackend};

/// REST client for the cinestack backend, which also proxies the catalog provider
#[derive(Clone)]
pub struct CineStackClient {
    session: SessionClient,
}

impl CineStackClient {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// Build from configuration and the stored credential
    pub fn from_config(config: &Config, credentials: &CredentialStore) -> Result<Self, ApiError> {
        let context = SessionContext::from_store(credentials);
        if context.is_authenticated() {
            info!("Using stored credential for {}", config.api.base_url);
        }
        let session = SessionClient::new(config.api.base_url.clone(), context, config.api.timeout())?;
        Ok(Self::new(session))
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.context().is_authenticated()
    }

    /// A client for the same backend without the credential
    pub fn sign_out(&self) -> Self {
        Self::new(self.session.sign_out())
    }
}

#[async_trait]
impl CatalogProvider for CineStackClient {
    async fn search(&self, query: &str, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
        api::search(&self.session, query, media_type, page).await
    }

    async fn popular(&self, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
        api::popular(&self.session, media_type, page).await
    }

    async fn details(&self, key: CatalogKey) -> Result<CatalogDetails, ApiError> {
        api::details(&self.session, key).await
    }

    async fn season(&self, external_id: u64, season_number: u32) -> Result<SeasonDetail, ApiError> {
        api::season(&self.session, external_id, season_number).await
    }
}

#[async_trait]
impl MovieStore for CineStackClient {
    async fn get_or_create(&self, record: &NewMovieRecord) -> Result<MovieRecord, ApiError> {
        api::get_or_create_movie(&self.session, record).await
    }
}

#[async_trait]
impl PlaylistBackend for CineStackClient {
    async fn list_playlists(&self) -> Result<Vec<PlaylistRecord>, ApiError> {
        api::list_playlists(&self.session).await
    }

    async fn get_playlist(&self, playlist_id: u64) -> Result<PlaylistDetail, ApiError> {
        api::get_playlist(&self.session, playlist_id).await
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<PlaylistRecord, ApiError> {
        api::create_playlist(&self.session, playlist).await
    }

    async fn delete_playlist(&self, playlist_id: u64) -> Result<(), ApiError> {
        api::delete_playlist(&self.session, playlist_id).await
    }

    async fn add_item(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
        api::add_movie(&self.session, playlist_id, movie_id, status).await
    }

    async fn update_item_status(&self, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
        api::update_movie_status(&self.session, playlist_id, movie_id, status).await
    }

    async fn remove_item(&self, playlist_id: u64, movie_id: u64) -> Result<(), ApiError> {
        api::remove_movie(&self.session, playlist_id, movie_id).await
    }
}
