use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::movie::MovieRecord;
use crate::status::WatchStatus;

/// Playlist summary with its derived counters.
///
/// `0 <= watched_count <= movie_count` always holds for records produced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub movie_count: u32,
    #[serde(default)]
    pub watched_count: u32,
}

impl PlaylistRecord {
    /// Percentage of watched titles, 0 for an empty playlist
    pub fn progress(&self) -> u8 {
        progress(self.watched_count, self.movie_count)
    }

    pub fn remaining(&self) -> u32 {
        self.movie_count.saturating_sub(self.watched_count)
    }
}

/// `round(watched / total * 100)`, defined as 0 when `total == 0`
pub fn progress(watched: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (f64::from(watched) / f64::from(total) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// One title in a playlist; unique per (playlist, movie).
///
/// The detail endpoint nests the full movie record; locally added items may only
/// know the movie id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "WirePlaylistItem")]
pub struct PlaylistItem {
    pub movie_id: u64,
    pub status: WatchStatus,
    pub added_at: DateTime<Utc>,
    pub movie: Option<MovieRecord>,
}

#[derive(Deserialize)]
struct WirePlaylistItem {
    movie_id: Option<u64>,
    movie: Option<MovieRecord>,
    status: WatchStatus,
    #[serde(alias = "created_at", default = "Utc::now")]
    added_at: DateTime<Utc>,
}

impl TryFrom<WirePlaylistItem> for PlaylistItem {
    type Error = String;

    fn try_from(wire: WirePlaylistItem) -> Result<Self, Self::Error> {
        let movie_id = wire
            .movie_id
            .or(wire.movie.as_ref().map(|m| m.id))
            .ok_or_else(|| "playlist item has neither movie_id nor movie".to_string())?;
        Ok(Self {
            movie_id,
            status: wire.status,
            added_at: wire.added_at,
            movie: wire.movie,
        })
    }
}

impl PlaylistItem {
    pub fn new(movie_id: u64, status: WatchStatus) -> Self {
        Self {
            movie_id,
            status,
            added_at: Utc::now(),
            movie: None,
        }
    }

    pub fn for_movie(movie: &MovieRecord, status: WatchStatus) -> Self {
        Self {
            movie: Some(movie.clone()),
            ..Self::new(movie.id, status)
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.movie.as_ref().map(|m| m.title.as_str())
    }
}

/// Playlist with its items, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub record: PlaylistRecord,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPlaylist {
    pub title: String,
    #[serde(default)]
    pub description: String,
}
