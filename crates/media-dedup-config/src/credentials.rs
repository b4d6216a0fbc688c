use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::config::ENV_JELLYFIN_API_KEY;

const JELLYFIN_API_KEY: &str = "jellyfin_api_key";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets kept outside `config.toml`
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

    pub fn get_jellyfin_api_key(&self) -> Option<&String> {
        self.get(JELLYFIN_API_KEY)
    }

    pub fn set_jellyfin_api_key(&mut self, key: String) {
        self.set(JELLYFIN_API_KEY.to_string(), key);
    }

    /// API key from `JELLYFIN_API_KEY`, falling back to the stored credential
    pub fn resolve_jellyfin_api_key(&self) -> Option<String> {
        self.resolve_jellyfin_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_jellyfin_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENV_JELLYFIN_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.get_jellyfin_api_key().cloned())
    }
}
