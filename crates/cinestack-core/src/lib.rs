pub mod error;
pub mod feed;
pub mod playlist;
pub mod record_cache;
pub mod resolver;
pub mod seasons;

#[cfg(test)]
mod fakes;

pub use error::CineError;
pub use feed::{keys, FeedAggregator, FeedQuery, FeedStream, FetchOutcome};
pub use playlist::PlaylistStore;
pub use record_cache::RecordCacheStorage;
pub use resolver::CatalogResolver;
pub use seasons::season_episodes;
