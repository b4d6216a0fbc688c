//! In-memory `MediaServer` used by the pipeline tests

use async_trait::async_trait;
use media_dedup_models::{Library, MovieRecord, PlayState, UserRecord};
use media_dedup_sources::{ItemPage, MediaServer, SourceError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ACCOUNT: &str = "admin";

/// Tracks how many calls of one kind are running at the same time
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeServer {
    libraries: Vec<Library>,
    movies: HashMap<String, Vec<MovieRecord>>,
    users: Vec<UserRecord>,
    played: HashMap<String, Vec<String>>,
    play_states: HashMap<(String, String), PlayState>,
    failing_libraries: HashSet<String>,
    failing_users: HashSet<String>,
    failing_play_states: HashSet<(String, String)>,
    fail_library_listing: bool,
    fail_user_listing: bool,
    latency: Duration,

    pub library_fetches: InFlight,
    pub user_fetches: InFlight,
    /// Library and played-item fetches counted together
    pub fetches: InFlight,
    pub list_movies_calls: AtomicUsize,
    pub get_user_calls: AtomicUsize,
    pub marked: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, id: &str, movies: Vec<MovieRecord>) -> Self {
        self.libraries.push(Library {
            id: id.to_string(),
            name: format!("Library {}", id),
            collection_type: Some("movies".to_string()),
        });
        self.movies.insert(id.to_string(), movies);
        self
    }

    pub fn with_user(mut self, id: &str, name: &str, played: &[&str]) -> Self {
        self.users.push(UserRecord {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.played
            .insert(id.to_string(), played.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn with_play_state(mut self, movie_id: &str, user_id: &str, state: PlayState) -> Self {
        self.play_states
            .insert((movie_id.to_string(), user_id.to_string()), state);
        self
    }

    pub fn failing_library(mut self, id: &str) -> Self {
        self.failing_libraries.insert(id.to_string());
        self
    }

    pub fn failing_user(mut self, id: &str) -> Self {
        self.failing_users.insert(id.to_string());
        self
    }

    pub fn failing_play_state(mut self, movie_id: &str, user_id: &str) -> Self {
        self.failing_play_states
            .insert((movie_id.to_string(), user_id.to_string()));
        self
    }

    pub fn failing_library_listing(mut self) -> Self {
        self.fail_library_listing = true;
        self
    }

    pub fn failing_user_listing(mut self) -> Self {
        self.fail_user_listing = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.users.clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn page_of(items: &[MovieRecord], offset: usize, page_size: usize) -> ItemPage {
        ItemPage {
            items: items.iter().skip(offset).take(page_size).cloned().collect(),
            total_count: items.len(),
        }
    }

    fn find_movie(&self, movie_id: &str) -> Option<&MovieRecord> {
        self.movies.values().flatten().find(|m| m.id == movie_id)
    }
}

#[async_trait]
impl MediaServer for FakeServer {
    fn server_name(&self) -> &str {
        "fake"
    }

    async fn list_libraries(&self, account_id: &str) -> Result<Vec<Library>, SourceError> {
        self.simulate_latency().await;
        if self.fail_library_listing || account_id != ACCOUNT {
            return Err(SourceError::Status {
                url: format!("fake://Users/{}/Views", account_id),
                status: 401,
                body: "Unauthorized".to_string(),
            });
        }
        Ok(self.libraries.clone())
    }

    async fn list_movies(&self, library_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError> {
        let _guard = self.library_fetches.enter();
        let _any = self.fetches.enter();
        self.list_movies_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.failing_libraries.contains(library_id) {
            return Err(SourceError::new(format!("library {} unavailable", library_id)));
        }
        let movies = self.movies.get(library_id).map(Vec::as_slice).unwrap_or_default();
        Ok(Self::page_of(movies, offset, page_size))
    }

    async fn get_movie_name(&self, movie_id: &str) -> Result<String, SourceError> {
        self.find_movie(movie_id)
            .map(|m| m.name.clone())
            .ok_or_else(|| SourceError::new(format!("movie {} not found", movie_id)))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        self.simulate_latency().await;
        if self.fail_user_listing {
            return Err(SourceError::new("user listing unavailable"));
        }
        Ok(self.users.clone())
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, SourceError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("user {} not found", user_id)))
    }

    async fn list_played_movies(&self, user_id: &str, offset: usize, page_size: usize) -> Result<ItemPage, SourceError> {
        let _guard = self.user_fetches.enter();
        let _any = self.fetches.enter();
        self.simulate_latency().await;
        if self.failing_users.contains(user_id) {
            return Err(SourceError::new(format!("played items of {} unavailable", user_id)));
        }
        let played: Vec<MovieRecord> = self
            .played
            .get(user_id)
            .into_iter()
            .flatten()
            .map(|id| {
                self.find_movie(id)
                    .cloned()
                    .unwrap_or_else(|| MovieRecord::new(id.clone(), "", 0, ""))
            })
            .collect();
        Ok(Self::page_of(&played, offset, page_size))
    }

    async fn get_single_play_state(&self, movie_id: &str, user_id: &str) -> Result<PlayState, SourceError> {
        let key = (movie_id.to_string(), user_id.to_string());
        if self.failing_play_states.contains(&key) {
            return Err(SourceError::new("user data unavailable"));
        }
        Ok(self.play_states.get(&key).copied().unwrap_or_default())
    }

    async fn mark_played(&self, movie_id: &str, user_id: &str) -> Result<(), SourceError> {
        if self.find_movie(movie_id).is_none() {
            return Err(SourceError::Status {
                url: format!("fake://Users/{}/PlayedItems/{}", user_id, movie_id),
                status: 404,
                body: "Item not found".to_string(),
            });
        }
        self.marked
            .lock()
            .unwrap()
            .push((movie_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn delete_movie(&self, movie_id: &str) -> Result<(), SourceError> {
        if self.find_movie(movie_id).is_none() {
            return Err(SourceError::Status {
                url: format!("fake://Items/{}", movie_id),
                status: 404,
                body: "Item not found".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(movie_id.to_string());
        Ok(())
    }
}

/// Movie with a path derived from its ID
pub fn movie(id: &str, name: &str, year: i32) -> MovieRecord {
    MovieRecord::new(id, name, year, format!("/movies/{}.mkv", id))
}

pub fn user(id: &str, name: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: name.to_string(),
    }
}
