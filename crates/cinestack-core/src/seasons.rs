use cinestack_models::{CatalogKey, MediaType, SeasonDetail};
use cinestack_sources::CatalogProvider;
use tracing::debug;
use crate::error::CineError;

/// Episodes of one season of a series.
///
/// Without an explicit `season` the first regular season is used; specials
/// (season 0) are only returned when asked for by number.
pub async fn season_episodes(
    provider: &dyn CatalogProvider,
    external_id: u64,
    season: Option<u32>,
) -> Result<SeasonDetail, CineError> {
    let key = CatalogKey::new(external_id, MediaType::Series);
    let season_number = match season {
        Some(n) => n,
        None => {
            let details = provider
                .details(key)
                .await
                .map_err(|e| CineError::from_provider(e, key))?;
            let first = details
                .regular_seasons()
                .next()
                .ok_or_else(|| CineError::NotFound(format!("seasons of {}", key)))?;
            debug!("Defaulting {} to season {}", key, first.season_number);
            first.season_number
        }
    };

    provider
        .season(external_id, season_number)
        .await
        .map_err(|e| match CineError::from_provider(e, key) {
            CineError::NotFound(_) => CineError::NotFound(format!("season {} of {}", season_number, key)),
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeCatalog, SEASONS};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_defaults_to_first_regular_season() {
        let catalog = FakeCatalog::new(1);

        let season = season_episodes(&catalog, 1396, None).await.unwrap();
        assert_eq!(season.season_number, 1);
        assert_eq!(season.episodes.len(), 3);
        assert_eq!(season.episodes[0].display_name(), "S1E1");
        assert_eq!(catalog.details_called(), 1);
    }

    #[tokio::test]
    async fn test_explicit_season_skips_details() {
        let catalog = FakeCatalog::new(1);

        let season = season_episodes(&catalog, 1396, Some(SEASONS)).await.unwrap();
        assert_eq!(season.season_number, SEASONS);
        assert_eq!(season.total_runtime(), 45 * season.episodes.len() as u32);
        assert_eq!(catalog.details_called(), 0);

        let specials = season_episodes(&catalog, 1396, Some(0)).await.unwrap();
        assert_eq!(specials.name, "Specials");
    }

    #[tokio::test]
    async fn test_unknown_season_or_series_is_not_found() {
        let catalog = FakeCatalog::new(1).with_missing(404);

        let err = season_episodes(&catalog, 1396, Some(SEASONS + 1)).await.unwrap_err();
        assert!(matches!(err, CineError::NotFound(ref what) if what.starts_with("season 3")), "got {:?}", err);
        assert!(matches!(season_episodes(&catalog, 404, None).await, Err(CineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_catalog_outage_is_retryable() {
        let catalog = FakeCatalog::new(1);
        catalog.fail_details.store(true, Ordering::SeqCst);

        let err = season_episodes(&catalog, 1396, Some(1)).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
