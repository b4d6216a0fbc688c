pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, JellyfinConfig, LoggingConfig, ENV_JELLYFIN_API_KEY, ENV_JELLYFIN_URL, ENV_JELLYFIN_USER_ID};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
