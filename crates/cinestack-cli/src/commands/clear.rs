use super::path_manager;
use crate::output::Output;
use cinestack_config::PathManager;
use cinestack_core::RecordCacheStorage;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::fs;

pub async fn run_clear(all: bool, cache: bool, credentials: bool, output: &Output) -> Result<()> {
    let paths = path_manager();

    if !(all || cache || credentials) {
        output.warn("No clear option specified. Use --cache, --credentials, or --all");
        output.info("Example: cinestack clear --cache");
        return Ok(());
    }

    let cleared_cache = if all || cache { clear_cache(&paths, output)? } else { false };
    let cleared_credentials = if all || credentials {
        clear_credentials(&paths, output)?
    } else {
        false
    };

    if all {
        output.success("Cache and credentials cleared");
    }
    output.json(&json!({
        "cache_cleared": cleared_cache,
        "credentials_cleared": cleared_credentials,
    }));
    Ok(())
}

fn clear_cache(paths: &PathManager, output: &Output) -> Result<bool> {
    let storage = RecordCacheStorage::new(paths.record_cache_file());
    let removed = storage
        .clear()
        .map_err(|e| eyre!("Failed to remove record cache at {}: {}", storage.path().display(), e))?;

    // Leftovers from a corrupt snapshot or an interrupted write
    let cache_dir = paths.cache_dir();
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)
            .map_err(|e| eyre!("Failed to remove cache directory {}: {}", cache_dir.display(), e))?;
    }

    if removed {
        output.success(format!("Cleared resolved records: {}", storage.path().display()));
    } else {
        output.info("No record cache found to clear");
    }
    Ok(removed)
}

fn clear_credentials(paths: &PathManager, output: &Output) -> Result<bool> {
    let credentials_file = paths.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found to clear");
        return Ok(false);
    }

    fs::remove_file(&credentials_file)
        .map_err(|e| eyre!("Failed to remove credentials file at {}: {}", credentials_file.display(), e))?;
    output.success(format!("Cleared credentials: {}", credentials_file.display()));
    Ok(true)
}
