use media_dedup_models::UserRecord;
use media_dedup_sources::{MediaServer, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Read-through cache of user ID -> display name
///
/// Seeded from the user listing; misses go to the server once and are
/// remembered.
pub struct UserNameCache {
    server: Arc<dyn MediaServer>,
    names: Mutex<HashMap<String, String>>,
}

impl UserNameCache {
    pub fn new(server: Arc<dyn MediaServer>) -> Self {
        Self {
            server,
            names: Mutex::new(HashMap::new()),
        }
    }

    pub async fn seed(&self, users: &[UserRecord]) {
        let mut names = self.names.lock().await;
        for user in users {
            names.insert(user.id.clone(), user.name.clone());
        }
    }

    pub async fn name_of(&self, user_id: &str) -> Result<String, SourceError> {
        if let Some(name) = self.names.lock().await.get(user_id) {
            return Ok(name.clone());
        }

        debug!("User name cache miss for {}", user_id);
        let user = self.server.get_user(user_id).await?;
        self.names
            .lock()
            .await
            .insert(user.id.clone(), user.name.clone());
        Ok(user.name)
    }

    pub async fn len(&self) -> usize {
        self.names.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.lock().await.is_empty()
    }
}
