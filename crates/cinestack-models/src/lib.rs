pub mod catalog;
pub mod media;
pub mod movie;
pub mod playlist;
pub mod status;

pub use catalog::{CatalogDetails, CatalogItem, CatalogPage, Episode, Genre, SeasonDetail, SeasonSummary, Video};
pub use media::{CatalogKey, MediaType};
pub use movie::{MovieRecord, NewMovieRecord};
pub use playlist::{progress, NewPlaylist, PlaylistDetail, PlaylistItem, PlaylistRecord};
pub use status::{InvalidStatus, WatchStatus};
