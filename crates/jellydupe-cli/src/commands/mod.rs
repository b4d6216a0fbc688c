pub mod analyze;
pub mod config;
pub mod delete;
pub mod mark_played;
pub mod progress;
pub mod prompts;

use color_eyre::Result;
use media_dedup_config::{Config, CredentialStore, PathManager};
use media_dedup_core::UserNameCache;
use media_dedup_sources::{JellyfinClient, MediaServer};
use std::sync::Arc;

/// Connected server plus the state shared by the core components
pub struct Session {
    pub server: Arc<dyn MediaServer>,
    pub names: Arc<UserNameCache>,
    pub account_id: String,
}

/// Validate the configuration, resolve the API key and build the Jellyfin client
pub fn connect(config: &Config, paths: &PathManager) -> Result<Session> {
    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration is incomplete: {}", e))?;

    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    let api_key = cred_store.resolve_jellyfin_api_key().ok_or_else(|| {
        color_eyre::eyre::eyre!(
            "Jellyfin API key is not set (run 'jellydupe config jellyfin' or set {})",
            media_dedup_config::ENV_JELLYFIN_API_KEY
        )
    })?;

    let client = JellyfinClient::new(&config.jellyfin.url, &api_key, &config.jellyfin.user_id)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create Jellyfin client: {}", e))?;
    let server: Arc<dyn MediaServer> = Arc::new(client);

    Ok(Session {
        names: Arc::new(UserNameCache::new(server.clone())),
        server,
        account_id: config.jellyfin.user_id.clone(),
    })
}

/// Jellyfin IDs are GUIDs, with or without dashes
pub fn validate_id(kind: &str, id: &str) -> Result<()> {
    let len = id.trim().chars().count();
    if !(32..=36).contains(&len) {
        return Err(color_eyre::eyre::eyre!(
            "Invalid {} '{}': expected a 32-36 character Jellyfin ID",
            kind,
            id
        ));
    }
    Ok(())
}
