use serde::{Deserialize, Serialize};
use crate::catalog::{year_from_date, CatalogDetails};
use crate::media::{CatalogKey, MediaType};

/// Durable local copy of a catalog title.
///
/// Created at most once per `(external_id, media_type)` and never refreshed in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: u64,
    #[serde(rename = "tmdb_id")]
    pub external_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    pub release_year: Option<u32>,
    pub rating: Option<f64>,
    pub trailer_url: Option<String>,
}

impl MovieRecord {
    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(self.external_id, self.media_type)
    }
}

/// What gets sent to the persistence backend when a title is first resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMovieRecord {
    #[serde(rename = "tmdb_id")]
    pub external_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub release_year: Option<u32>,
    pub rating: Option<f64>,
    pub trailer_url: Option<String>,
}

impl NewMovieRecord {
    pub fn from_details(details: &CatalogDetails) -> Self {
        let item = &details.item;
        Self {
            external_id: item.external_id,
            media_type: item.media_type,
            title: item.title.clone(),
            poster_path: item.poster_path.clone(),
            backdrop_path: item.backdrop_path.clone(),
            overview: item.overview.clone(),
            release_year: item.release_date.as_deref().and_then(year_from_date),
            rating: item.vote_average,
            trailer_url: details.trailer_url(),
        }
    }

    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(self.external_id, self.media_type)
    }

    /// Attach the id assigned by the persistence backend
    pub fn into_record(self, id: u64) -> MovieRecord {
        MovieRecord {
            id,
            external_id: self.external_id,
            media_type: self.media_type,
            title: self.title,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            overview: self.overview,
            release_year: self.release_year,
            rating: self.rating,
            trailer_url: self.trailer_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, Video};

    #[test]
    fn test_new_record_from_details() {
        let details = CatalogDetails {
            item: CatalogItem {
                external_id: 1396,
                media_type: MediaType::Series,
                title: "Breaking Bad".to_string(),
                poster_path: Some("/bb.jpg".to_string()),
                backdrop_path: Some("/bb-back.jpg".to_string()),
                overview: "A chemistry teacher".to_string(),
                release_date: Some("2008-01-20".to_string()),
                vote_average: Some(8.9),
            },
            genres: vec![],
            runtime: None,
            seasons: vec![],
            videos: vec![Video { key: "HhesaQXLuRY".into(), site: "YouTube".into(), video_type: "Trailer".into() }],
        };

        let new = NewMovieRecord::from_details(&details);
        assert_eq!(new.key(), CatalogKey::new(1396, MediaType::Series));
        assert_eq!(new.release_year, Some(2008));
        assert_eq!(new.rating, Some(8.9));
        assert_eq!(new.trailer_url.as_deref(), Some("https://www.youtube.com/watch?v=HhesaQXLuRY"));

        let record = new.into_record(42);
        assert_eq!(record.id, 42);
        assert_eq!(record.title, "Breaking Bad");
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::json!({
            "id": 7,
            "tmdb_id": 603,
            "media_type": "movie",
            "title": "The Matrix",
            "poster_path": null,
            "backdrop_path": null,
            "release_year": 1999,
            "rating": 8.2,
            "trailer_url": null
        });
        let record: MovieRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.external_id, 603);
        assert_eq!(record.overview, "");
    }
}
