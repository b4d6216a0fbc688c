use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_JELLYFIN_URL: &str = "JELLYFIN_URL";
pub const ENV_JELLYFIN_API_KEY: &str = "JELLYFIN_API_KEY";
pub const ENV_JELLYFIN_USER_ID: &str = "JELLYFIN_ADMIN_USER_ID";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub jellyfin: JellyfinConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct JellyfinConfig {
    /// Base URL of the server, e.g. "http://jellyfin.local:8096"
    #[serde(default)]
    pub url: String,
    /// Account whose library views define the catalog (usually an admin)
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if present, otherwise start from defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `JELLYFIN_URL` / `JELLYFIN_ADMIN_USER_ID` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_JELLYFIN_URL).filter(|v| !v.trim().is_empty()) {
            self.jellyfin.url = url;
        }
        if let Some(user_id) = lookup(ENV_JELLYFIN_USER_ID).filter(|v| !v.trim().is_empty()) {
            self.jellyfin.user_id = user_id;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.jellyfin.url.trim();
        if url.is_empty() {
            return Err(anyhow::anyhow!(
                "Jellyfin URL is not configured (set it with 'jellydupe config jellyfin --url' or {})",
                ENV_JELLYFIN_URL
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow::anyhow!("Jellyfin URL must start with http:// or https://: {}", url));
        }
        if self.jellyfin.user_id.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Jellyfin user ID is not configured (set it with 'jellydupe config jellyfin --user-id' or {})",
                ENV_JELLYFIN_USER_ID
            ));
        }
        Ok(())
    }

    pub fn is_jellyfin_configured(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn configured() -> Config {
        Config {
            jellyfin: JellyfinConfig {
                url: "http://jellyfin.local:8096".to_string(),
                user_id: "0f8fad5bd9cb469fa16570867728950e".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
                file: None,
            },
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        configured().save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.jellyfin.url, "http://jellyfin.local:8096");
        assert_eq!(loaded.jellyfin.user_id, "0f8fad5bd9cb469fa16570867728950e");
        assert_eq!(loaded.logging.level, "debug");
        assert!(!loaded.logging.json);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[jellyfin]\nurl = \"https://jf.example\"\n").unwrap();
        assert_eq!(config.jellyfin.url, "https://jf.example");
        assert!(config.jellyfin.user_id.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validate() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.jellyfin.url = "jellyfin.local".to_string();
        assert!(config.validate().is_err());

        config.jellyfin.url = String::new();
        assert!(!config.is_jellyfin_configured());

        let mut config = configured();
        config.jellyfin.user_id = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = configured();
        config.apply_overrides_with(|name| match name {
            ENV_JELLYFIN_URL => Some("https://override.example".to_string()),
            ENV_JELLYFIN_USER_ID => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.jellyfin.url, "https://override.example");
        // blank values do not clobber the file
        assert_eq!(config.jellyfin.user_id, "0f8fad5bd9cb469fa16570867728950e");
    }
}
