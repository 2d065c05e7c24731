use cinestack_models::{
    CatalogDetails, CatalogItem, CatalogKey, CatalogPage, Genre, MediaType, MovieRecord, NewMovieRecord,
    NewPlaylist, PlaylistDetail, PlaylistRecord, SeasonDetail, SeasonSummary, Video, WatchStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::error::ApiError;
use crate::session::SessionClient;

/// Catalog entry as the proxy returns it (movies use `title`/`release_date`, series `name`/`first_air_date`)
#[derive(Debug, Deserialize)]
struct RawCatalogItem {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalogPage {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    results: Vec<RawCatalogItem>,
}

#[derive(Debug, Deserialize)]
struct RawVideos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    #[serde(flatten)]
    item: RawCatalogItem,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
    videos: Option<RawVideos>,
}

#[derive(Debug, Serialize)]
struct AddMovieBody {
    movie_id: u64,
    status: WatchStatus,
}

#[derive(Debug, Serialize)]
struct GetOrCreateBody {
    tmdb_id: u64,
    media_type: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: WatchStatus,
}

fn first_page() -> u32 {
    1
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl RawCatalogItem {
    /// Mixed result sets tag each entry; untagged entries are of the requested type.
    /// `None` for tags we do not model (people, collections).
    fn resolved_type(&self, requested: MediaType) -> Option<MediaType> {
        match self.media_type.as_deref() {
            None => Some(requested),
            Some(tag) => tag.parse().ok(),
        }
    }

    fn into_item(self, media_type: MediaType) -> CatalogItem {
        CatalogItem {
            external_id: self.id,
            media_type,
            title: non_empty(self.title).or(non_empty(self.name)).unwrap_or_default(),
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            overview: self.overview.unwrap_or_default(),
            release_date: non_empty(self.release_date).or(non_empty(self.first_air_date)),
            vote_average: self.vote_average,
        }
    }
}

impl RawCatalogPage {
    fn into_page(self, requested: MediaType) -> CatalogPage {
        let results: Vec<CatalogItem> = self
            .results
            .into_iter()
            .filter(|raw| raw.resolved_type(requested) == Some(requested))
            .map(|raw| raw.into_item(requested))
            .collect();
        CatalogPage {
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            results,
        }
    }
}

impl RawDetails {
    fn into_details(self, requested: MediaType) -> CatalogDetails {
        CatalogDetails {
            item: self.item.into_item(requested),
            genres: self.genres,
            runtime: self.runtime,
            seasons: self.seasons,
            videos: self.videos.map(|v| v.results).unwrap_or_default(),
        }
    }
}

fn page_query(media_type: MediaType, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("type", media_type.catalog_name().to_string()),
        ("page", page.max(1).to_string()),
    ]
}

/// Search the catalog by free text
pub async fn search(session: &SessionClient, query: &str, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
    let mut params = page_query(media_type, page);
    params.push(("query", query.to_string()));
    let raw: RawCatalogPage = session.get("/api/tmdb/search/", &params).await?;
    debug!("Search '{}' page {}: {} results of {} pages", query, raw.page, raw.results.len(), raw.total_pages);
    Ok(raw.into_page(media_type))
}

pub async fn popular(session: &SessionClient, media_type: MediaType, page: u32) -> Result<CatalogPage, ApiError> {
    let raw: RawCatalogPage = session.get("/api/tmdb/popular/", &page_query(media_type, page)).await?;
    Ok(raw.into_page(media_type))
}

/// Detail endpoint, including seasons for series and the video list
pub async fn details(session: &SessionClient, key: CatalogKey) -> Result<CatalogDetails, ApiError> {
    let path = match key.media_type {
        MediaType::Movie => format!("/api/tmdb/movies/{}/", key.external_id),
        MediaType::Series => format!("/api/tmdb/tv/{}/", key.external_id),
    };
    let raw: RawDetails = session.get(&path, &[]).await?;
    Ok(raw.into_details(key.media_type))
}

/// Episodes of one season; only series have seasons
pub async fn season(session: &SessionClient, external_id: u64, season_number: u32) -> Result<SeasonDetail, ApiError> {
    let path = format!("/api/tmdb/tv/{}/seasons/{}/", external_id, season_number);
    let season: SeasonDetail = session.get(&path, &[]).await?;
    debug!("Season {} of {}: {} episodes", season_number, external_id, season.episodes.len());
    Ok(season)
}

/// Server-side get-or-create keyed by catalog id and media type.
/// The backend fills in the remaining fields from its own catalog lookup.
pub async fn get_or_create_movie(session: &SessionClient, record: &NewMovieRecord) -> Result<MovieRecord, ApiError> {
    let key = record.key();
    let body = GetOrCreateBody {
        tmdb_id: key.external_id,
        media_type: key.media_type.catalog_name(),
    };
    let stored: MovieRecord = session.post("/api/movies/get_or_create/", &body).await?;
    if stored.key() != key {
        warn!("Backend returned {} for a get-or-create of {}", stored.key(), key);
    }
    Ok(stored)
}

pub async fn list_playlists(session: &SessionClient) -> Result<Vec<PlaylistRecord>, ApiError> {
    session.get("/api/playlists/", &[]).await
}

pub async fn get_playlist(session: &SessionClient, playlist_id: u64) -> Result<PlaylistDetail, ApiError> {
    session.get(&format!("/api/playlists/{}/", playlist_id), &[]).await
}

pub async fn create_playlist(session: &SessionClient, playlist: &NewPlaylist) -> Result<PlaylistRecord, ApiError> {
    session.post("/api/playlists/", playlist).await
}

pub async fn delete_playlist(session: &SessionClient, playlist_id: u64) -> Result<(), ApiError> {
    session.delete(&format!("/api/playlists/{}/", playlist_id)).await
}

pub async fn add_movie(session: &SessionClient, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
    let body = AddMovieBody { movie_id, status };
    session.post_unit(&format!("/api/playlists/{}/add_movie/", playlist_id), &body).await
}

pub async fn update_movie_status(session: &SessionClient, playlist_id: u64, movie_id: u64, status: WatchStatus) -> Result<(), ApiError> {
    let body = StatusBody { status };
    session
        .patch_unit(&format!("/api/playlists/{}/update_item_status/{}/", playlist_id, movie_id), &body)
        .await
}

pub async fn remove_movie(session: &SessionClient, playlist_id: u64, movie_id: u64) -> Result<(), ApiError> {
    session
        .delete(&format!("/api/playlists/{}/remove_movie/{}/", playlist_id, movie_id))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::test_server::{json_response, serve_once};
    use reqwest::Client;
    use serde_json::json;
    use std::time::Duration;

    fn session(base_url: &str) -> SessionClient {
        let client = Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap();
        SessionClient::with_client(client, base_url, SessionContext::with_credential("secret"))
    }

    fn new_record(external_id: u64, media_type: MediaType) -> NewMovieRecord {
        NewMovieRecord {
            external_id,
            media_type,
            title: "The Matrix".to_string(),
            poster_path: None,
            backdrop_path: None,
            overview: String::new(),
            release_year: Some(1999),
            rating: Some(8.2),
            trailer_url: None,
        }
    }

    #[test]
    fn test_series_fields_map_to_item() {
        let raw: RawCatalogItem = serde_json::from_value(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "poster_path": "/bb.jpg",
            "backdrop_path": "",
            "overview": "A chemistry teacher",
            "first_air_date": "2008-01-20",
            "vote_average": 8.9
        }))
        .unwrap();

        let item = raw.into_item(MediaType::Series);
        assert_eq!(item.title, "Breaking Bad");
        assert_eq!(item.release_year(), Some(2008));
        assert_eq!(item.backdrop_path, None);
        assert_eq!(item.key(), CatalogKey::new(1396, MediaType::Series));
    }

    #[test]
    fn test_page_drops_other_media_types() {
        let raw: RawCatalogPage = serde_json::from_value(json!({
            "page": 1,
            "total_pages": 4,
            "total_results": 70,
            "results": [
                {"id": 1, "title": "Heat", "media_type": "movie"},
                {"id": 2, "name": "Heat Wave", "media_type": "tv"},
                {"id": 3, "title": "Heat 2"},
                {"id": 4, "name": "Al Pacino", "media_type": "person"}
            ]
        }))
        .unwrap();

        let page = raw.into_page(MediaType::Movie);
        assert!(page.has_more());
        let ids: Vec<u64> = page.results.iter().map(|i| i.external_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_missing_paging_metadata_defaults() {
        let raw: RawCatalogPage = serde_json::from_value(json!({"results": []})).unwrap();
        let page = raw.into_page(MediaType::Movie);
        assert_eq!(page.page, 1);
        assert!(!page.has_more());
    }

    #[test]
    fn test_details_collects_videos_and_seasons() {
        let raw: RawDetails = serde_json::from_value(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "seasons": [
                {"season_number": 1, "name": "Season 1", "episode_count": 7, "air_date": "2008-01-20"},
                {"season_number": 2, "name": "Season 2", "episode_count": 13, "air_date": null}
            ],
            "videos": {"results": [{"key": "HhesaQXLuRY", "site": "YouTube", "type": "Trailer"}]}
        }))
        .unwrap();

        let details = raw.into_details(MediaType::Series);
        assert_eq!(details.episode_count(), 20);
        assert_eq!(details.trailer_key(), Some("HhesaQXLuRY"));
    }

    #[tokio::test]
    async fn test_get_or_create_posts_catalog_key() {
        let stored = r#"{"id":42,"tmdb_id":603,"media_type":"movie","title":"The Matrix","poster_path":null,"backdrop_path":null,"overview":"","release_year":1999,"rating":8.2,"trailer_url":null}"#;
        let (base, handle) = serve_once(json_response(stored)).await;

        let record = get_or_create_movie(&session(&base), &new_record(603, MediaType::Movie)).await.unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.key(), CatalogKey::new(603, MediaType::Movie));

        let request = handle.await.unwrap();
        assert!(request.starts_with("post /api/movies/get_or_create/ "));
        assert!(request.contains("\"tmdb_id\":603"));
        assert!(request.contains("\"media_type\":\"movie\""));
    }

    #[tokio::test]
    async fn test_get_or_create_sends_tv_for_series() {
        let stored = r#"{"id":7,"tmdb_id":1396,"media_type":"tv","title":"Breaking Bad","poster_path":null,"backdrop_path":null,"release_year":2008,"rating":null,"trailer_url":null}"#;
        let (base, handle) = serve_once(json_response(stored)).await;

        let record = get_or_create_movie(&session(&base), &new_record(1396, MediaType::Series)).await.unwrap();
        assert_eq!(record.media_type, MediaType::Series);

        let request = handle.await.unwrap();
        assert!(request.contains("\"media_type\":\"tv\""));
    }

    #[tokio::test]
    async fn test_season_fetches_episode_listing() {
        let body = r#"{"season_number":2,"name":"Season 2","episodes":[{"episode_number":1,"name":"Seven Thirty-Seven","air_date":"2009-03-08","runtime":47,"still_path":null}]}"#;
        let (base, handle) = serve_once(json_response(body)).await;

        let detail = season(&session(&base), 1396, 2).await.unwrap();
        assert_eq!(detail.season_number, 2);
        assert_eq!(detail.episodes[0].display_name(), "Seven Thirty-Seven");
        assert_eq!(detail.episodes[0].runtime, Some(47));

        let request = handle.await.unwrap();
        assert!(request.starts_with("get /api/tmdb/tv/1396/seasons/2/ "));
    }
}
