use anyhow::Result;
use async_trait::async_trait;
use media_dedup_models::{Library, MovieRecord, PlayState, UserRecord};
use tracing::{debug, info};
use crate::error::SourceError;
use crate::jellyfin::api::{JellyfinHttpClient, MovieScope};
use crate::traits::{ItemPage, MediaServer};

/// `MediaServer` backed by the Jellyfin REST API
pub struct JellyfinClient {
    api: JellyfinHttpClient,
    // account used for library views and item name lookups
    account_id: String,
}

impl JellyfinClient {
    pub fn new(base_url: &str, api_key: &str, account_id: &str) -> Result<Self> {
        if account_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Jellyfin account user ID is not set"));
        }
        let api = JellyfinHttpClient::new(base_url, api_key)?;
        info!("Jellyfin client ready for {}", api.base_url());
        Ok(Self {
            api,
            account_id: account_id.to_string(),
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn movie_page(&self, scope: MovieScope<'_>, offset: usize, page_size: usize) -> Result<ItemPage, SourceError> {
        let response = self.api.get_movies(scope, offset, page_size).await?;
        debug!(
            "Jellyfin {:?}: offset={} received={} total={}",
            scope,
            offset,
            response.items.len(),
            response.total_record_count
        );
        Ok(ItemPage {
            items: response.items.into_iter().map(MovieRecord::from).collect(),
            total_count: response.total_record_count,
        })
    }
}

#[async_trait]
impl MediaServer for JellyfinClient {
    fn server_name(&self) -> &str {
        "jellyfin"
    }

    async fn list_libraries(&self, account_id: &str) -> Result<Vec<Library>, SourceError> {
        let views = self.api.get_views(account_id).await?;
        Ok(views.into_iter().map(Library::from).collect())
    }

    async fn list_movies(&self, library_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError> {
        self.movie_page(MovieScope::Library(library_id), offset, page_size).await
    }

    async fn get_movie_name(&self, movie_id: &str) -> Result<String, SourceError> {
        let item = self.api.get_user_item(&self.account_id, movie_id).await?;
        Ok(item.name.unwrap_or_default())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        let users = self.api.get_users().await?;
        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, SourceError> {
        Ok(self.api.get_user(user_id).await?.into())
    }

    async fn list_played_movies(&self, user_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError> {
        self.movie_page(MovieScope::PlayedBy(user_id), offset, page_size).await
    }

    async fn get_single_play_state(&self, movie_id: &str, user_id: &str) -> Result<PlayState, SourceError> {
        let item = self.api.get_user_item(user_id, movie_id).await?;
        Ok(item.user_data.map(PlayState::from).unwrap_or_default())
    }

    async fn mark_played(&self, movie_id: &str, user_id: &str) -> Result<(), SourceError> {
        self.api.post_played_item(user_id, movie_id).await
    }

    async fn delete_movie(&self, movie_id: &str) -> Result<(), SourceError> {
        self.api.delete_item(movie_id).await
    }
}
