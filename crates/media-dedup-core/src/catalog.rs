use crate::error::RetrievalError;
use crate::paging::fetch_all_pages;
use futures::{stream, StreamExt, TryStreamExt};
use media_dedup_models::{Library, MovieRecord};
use media_dedup_sources::MediaServer;
use std::sync::Arc;
use tracing::{debug, info};

/// Items requested per listing page
pub const PAGE_SIZE: usize = 100;

/// Libraries fetched at the same time
pub const MAX_CONCURRENT_LIBRARY_FETCHES: usize = 5;

/// Fetches every movie of every library visible to one account
pub struct CatalogFetcher {
    server: Arc<dyn MediaServer>,
    account_id: String,
    page_size: usize,
    max_concurrent: usize,
}

impl CatalogFetcher {
    pub fn new(server: Arc<dyn MediaServer>, account_id: impl Into<String>) -> Self {
        Self {
            server,
            account_id: account_id.into(),
            page_size: PAGE_SIZE,
            max_concurrent: MAX_CONCURRENT_LIBRARY_FETCHES,
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

    /// All movies across all libraries, in no particular order.
    ///
    /// The library list is fetched first; libraries are then paged through
    /// concurrently. The first failing library fails the whole fetch.
    pub async fn fetch_all_movies(&self) -> Result<Vec<MovieRecord>, RetrievalError> {
        let libraries = self
            .server
            .list_libraries(&self.account_id)
            .await
            .map_err(|source| RetrievalError::Libraries {
                account: self.account_id.clone(),
                source,
            })?;
        info!("Found {} libraries on {}", libraries.len(), self.server.server_name());

        let per_library: Vec<Vec<MovieRecord>> = stream::iter(libraries)
            .map(|library| self.fetch_library(library))
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;

        let movies: Vec<MovieRecord> = per_library.into_iter().flatten().collect();
        info!("Fetched {} movies", movies.len());
        Ok(movies)
    }

    async fn fetch_library(&self, library: Library) -> Result<Vec<MovieRecord>, RetrievalError> {
        debug!("Fetching movies of library '{}' ({})", library.name, library.id);
        let movies = fetch_all_pages(|offset| {
            debug!("Library {}: page at offset {}", library.id, offset);
            self.server.list_movies(&library.id, offset, self.page_size)
        })
        .await
        .map_err(|source| RetrievalError::Library {
            library_id: library.id.clone(),
            library_name: library.name.clone(),
            source,
        })?;
        debug!("Library '{}': {} movies", library.name, movies.len());
        Ok(movies)
    }
}
