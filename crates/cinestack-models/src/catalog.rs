use serde::{Deserialize, Serialize};
use crate::media::{CatalogKey, MediaType};

/// A title as the external catalog reports it. Never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub external_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    /// `YYYY-MM-DD` as reported (first air date for series)
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
}

impl CatalogItem {
    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(self.external_id, self.media_type)
    }

    pub fn release_year(&self) -> Option<u32> {
        self.release_date.as_deref().and_then(year_from_date)
    }

    /// Full image URL, e.g. `image_url("https://image.tmdb.org/t/p/", "w500")`
    pub fn poster_url(&self, image_base: &str, size: &str) -> Option<String> {
        self.poster_path.as_deref().map(|path| image_url(image_base, size, path))
    }
}

/// One page of a search or listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    pub results: Vec<CatalogItem>,
}

impl CatalogPage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: String,
    #[serde(default)]
    pub episode_count: u32,
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub episode_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub air_date: Option<String>,
    /// Minutes
    pub runtime: Option<u32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
}

impl Episode {
    /// Name as listed, or "Episode N" when the catalog has none yet
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Episode {}", self.episode_number)
        } else {
            self.name.clone()
        }
    }
}

/// One season of a series with its episodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonDetail {
    pub season_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub air_date: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl SeasonDetail {
    /// Sum of known episode runtimes, in minutes
    pub fn total_runtime(&self) -> u32 {
        self.episodes.iter().filter_map(|e| e.runtime).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

/// Full metadata from a detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogDetails {
    pub item: CatalogItem,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

impl CatalogDetails {
    /// First YouTube trailer in the video list
    pub fn trailer_key(&self) -> Option<&str> {
        self.videos
            .iter()
            .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
            .map(|v| v.key.as_str())
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.trailer_key().map(|key| format!("https://www.youtube.com/watch?v={}", key))
    }

    pub fn episode_count(&self) -> u32 {
        self.seasons.iter().map(|s| s.episode_count).sum()
    }

    /// Regular seasons in order; season 0 holds specials and is left out
    pub fn regular_seasons(&self) -> impl Iterator<Item = &SeasonSummary> {
        self.seasons.iter().filter(|s| s.season_number != 0)
    }
}

pub fn image_url(image_base: &str, size: &str, path: &str) -> String {
    format!("{}/{}{}", image_base.trim_end_matches('/'), size, path)
}

pub(crate) fn year_from_date(date: &str) -> Option<u32> {
    date.get(..4).and_then(|y| y.parse().ok())
}
