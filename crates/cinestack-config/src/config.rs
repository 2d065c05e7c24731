use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub feeds: FeedConfig,
}

/// Persistence backend (which also proxies the catalog provider)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    #[serde(default = "default_poster_size")]
    pub poster_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upper bound on pages a single command keeps fetching
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_base_url() -> String {
    std::env::var("CINESTACK_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_poster_size() -> String {
    "w500".to_string()
}

fn default_page_limit() -> u32 {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            poster_size: default_poster_size(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the file if present, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!("api.base_url must start with http:// or https:// (got '{}')", base);
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than zero");
        }
        if self.feeds.page_limit == 0 {
            anyhow::bail!("feeds.page_limit must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            api: ApiConfig {
                base_url: "https://cinestack.example.com".to_string(),
                timeout_secs: 30,
            },
            images: ImageConfig::default(),
            feeds: FeedConfig { page_limit: 2 },
        };

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.api.base_url, "https://cinestack.example.com");
        assert_eq!(loaded.api.timeout(), Duration::from_secs(30));
        assert_eq!(loaded.feeds.page_limit, 2);
        assert_eq!(loaded.images.poster_size, "w500");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[api]\nbase_url = \"http://10.0.2.2:8000\"\n").unwrap();
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.feeds.page_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        config.api.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "http://localhost:8000".to_string();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.api.timeout_secs = 15;
        assert!(config.validate().is_ok());
    }
}
