use async_trait::async_trait;
use media_dedup_models::{Library, MovieRecord, PlayState, UserRecord};
use crate::error::SourceError;

/// One page of an item listing
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<MovieRecord>,
    /// Total number of items the server reports for the whole listing
    pub total_count: usize,
}

/// Remote media-server API used by the analysis pipeline
///
/// Implementations only translate calls to the wire; paging, fan-out and
/// failure policy live in the core crate.
#[async_trait]
pub trait MediaServer: Send + Sync {
    fn server_name(&self) -> &str;

    // Catalog
    async fn list_libraries(&self, account_id: &str) -> Result<Vec<Library>, SourceError>;

    /// Movies of one library. Items must carry path, name and production year.
    async fn list_movies(&self, library_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError>;

    async fn get_movie_name(&self, movie_id: &str) -> Result<String, SourceError>;

    // Users and watch state
    async fn list_users(&self) -> Result<Vec<UserRecord>, SourceError>;
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, SourceError>;

    /// Movies the user has played, filtered server-side
    async fn list_played_movies(&self, user_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError>;

    /// Exact watch state for one (movie, user) pair, including play count
    async fn get_single_play_state(&self, movie_id: &str, user_id: &str) -> Result<PlayState, SourceError>;

    // Operator actions
    async fn mark_played(&self, movie_id: &str, user_id: &str) -> Result<(), SourceError>;
    async fn delete_movie(&self, movie_id: &str) -> Result<(), SourceError>;
}
