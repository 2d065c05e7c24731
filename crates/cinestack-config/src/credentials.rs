use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const API_TOKEN: &str = "api_token";
const USERNAME: &str = "username";
const SIGNED_IN_AT: &str = "signed_in_at";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Durable key/value storage for the session credential.
///
/// The core only reads the token once at startup; writing happens on explicit
/// sign-in and sign-out.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_api_token(&self) -> Option<&String> {
        self.get(API_TOKEN).filter(|t| !t.is_empty())
    }

    /// Store a freshly issued token together with who it belongs to
    pub fn set_api_token(&mut self, token: String, username: &str) {
        self.set(API_TOKEN.to_string(), token);
        self.set(USERNAME.to_string(), username.to_string());
        self.set(SIGNED_IN_AT.to_string(), Utc::now().to_rfc3339());
    }

    pub fn clear_api_token(&mut self) {
        self.remove(API_TOKEN);
        self.remove(SIGNED_IN_AT);
    }

    pub fn get_username(&self) -> Option<&String> {
        self.get(USERNAME)
    }

    pub fn get_signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.get(SIGNED_IN_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}
