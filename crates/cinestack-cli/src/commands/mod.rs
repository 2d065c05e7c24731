pub mod auth;
pub mod catalog;
pub mod clear;
pub mod config;
pub mod playlist;
pub mod prompts;

use crate::output::Output;
use cinestack_config::{Config, CredentialStore, PathManager};
use cinestack_core::{CatalogResolver, CineError, FeedAggregator, PlaylistStore, RecordCacheStorage};
use cinestack_sources::{CatalogProvider, CineStackClient};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;

pub fn path_manager() -> PathManager {
    PathManager::default()
}

pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok(config)
}

pub fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut store = CredentialStore::new(credentials_file.clone());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(store)
}

/// Everything a command needs, wired once from config and the stored credential
pub struct App {
    pub config: Config,
    pub catalog: Arc<dyn CatalogProvider>,
    pub resolver: CatalogResolver,
    pub feeds: FeedAggregator,
    pub playlists: PlaylistStore,
    record_cache: RecordCacheStorage,
}

impl App {
    pub fn load() -> Result<Self> {
        let paths = path_manager();
        let config = load_config(&paths)?;
        let credentials = load_credentials(&paths)?;
        let client = CineStackClient::from_config(&config, &credentials)
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        let record_cache = RecordCacheStorage::new(paths.record_cache_file());
        let records = record_cache
            .load()
            .map_err(|e| eyre!("Failed to read record cache {}: {}", record_cache.path().display(), e))?;

        let shared = Arc::new(client);
        Ok(Self {
            resolver: CatalogResolver::with_records(shared.clone(), shared.clone(), records),
            feeds: FeedAggregator::new(shared.clone()),
            playlists: PlaylistStore::new(shared.clone()),
            catalog: shared,
            config,
            record_cache,
        })
    }

    /// Persist resolved records so the next run skips the lookups
    pub async fn save_records(&self) {
        let records = self.resolver.records().await;
        if let Err(e) = self.record_cache.save(&records) {
            tracing::warn!("Could not save record cache: {}", e);
        }
    }
}

/// Report a core failure the way the user is expected to act on it
pub fn fail(err: CineError, output: &Output) -> color_eyre::Report {
    if err.requires_reauth() {
        output.error("Your session has expired or the token was rejected. Run `cinestack login` to sign in again.");
    } else if err.is_retryable() {
        output.error(format!("{} (temporary, try again)", err));
    } else {
        output.error(err.to_string());
    }
    eyre!(err)
}
