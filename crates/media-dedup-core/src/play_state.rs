use crate::catalog::PAGE_SIZE;
use crate::error::RetrievalError;
use crate::names::UserNameCache;
use crate::paging::fetch_all_pages;
use futures::{stream, TryStreamExt};
use media_dedup_models::UserRecord;
use media_dedup_sources::MediaServer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Users whose played items are fetched at the same time
pub const MAX_CONCURRENT_USER_FETCHES: usize = 5;

/// User ID -> IDs of the movies that user has played
pub type SeenSets = HashMap<String, HashSet<String>>;

/// Builds the per-user set of played movies
pub struct PlayStateAggregator {
    server: Arc<dyn MediaServer>,
    names: Arc<UserNameCache>,
    page_size: usize,
    max_concurrent: usize,
}

impl PlayStateAggregator {
    pub fn new(server: Arc<dyn MediaServer>, names: Arc<UserNameCache>) -> Self {
        Self {
            server,
            names,
            page_size: PAGE_SIZE,
            max_concurrent: MAX_CONCURRENT_USER_FETCHES,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Full user list; also seeds the user name cache
    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, RetrievalError> {
        let users = self
            .server
            .list_users()
            .await
            .map_err(|source| RetrievalError::Users { source })?;
        self.names.seed(&users).await;
        info!("Found {} users", users.len());
        Ok(users)
    }

    /// Played movie IDs for each of the given users.
    ///
    /// Every user gets an entry, possibly empty. Any user failing aborts the
    /// aggregation and discards what the others returned.
    pub async fn fetch_play_states(&self, users: &[UserRecord]) -> Result<SeenSets, RetrievalError> {
        let seen: Mutex<SeenSets> = Mutex::new(HashMap::with_capacity(users.len()));
        let accumulator = &seen;

        stream::iter(users.iter().map(Ok::<_, RetrievalError>))
            .try_for_each_concurrent(self.max_concurrent, |user| async move {
                let played = self.fetch_user(user).await?;
                accumulator.lock().await.insert(user.id.clone(), played);
                Ok(())
            })
            .await?;

        let seen = seen.into_inner();
        info!(
            "Fetched play states for {} users ({} played entries)",
            seen.len(),
            seen.values().map(HashSet::len).sum::<usize>()
        );
        Ok(seen)
    }

    async fn fetch_user(&self, user: &UserRecord) -> Result<HashSet<String>, RetrievalError> {
        debug!("Fetching played items of '{}' ({})", user.name, user.id);
        let items = fetch_all_pages(|offset| self.server.list_played_movies(&user.id, offset, self.page_size))
            .await
            .map_err(|source| RetrievalError::PlayedItems {
                user_id: user.id.clone(),
                user_name: user.name.clone(),
                source,
            })?;
        debug!("User '{}': {} played movies", user.name, items.len());
        Ok(items.into_iter().map(|movie| movie.id).collect())
    }
}
