use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    /// `tv` on the wire, matching the catalog provider
    #[serde(rename = "tv", alias = "series")]
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }

    /// Name used on the wire, in `type=` query parameters and detail paths
    pub fn catalog_name(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaType::Movie),
            "series" | "tv" | "show" => Ok(MediaType::Series),
            other => Err(format!("Invalid media type: {}. Use 'movie' or 'series'", other)),
        }
    }
}

/// Identity of a catalog title: the provider id is only unique within a media type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub external_id: u64,
    pub media_type: MediaType,
}

impl CatalogKey {
    pub fn new(external_id: u64, media_type: MediaType) -> Self {
        Self { external_id, media_type }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.external_id)
    }
}
