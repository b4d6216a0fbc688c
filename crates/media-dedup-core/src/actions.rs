use crate::names::UserNameCache;
use media_dedup_models::{DuplicateVerdict, PlayState};
use media_dedup_sources::{MediaServer, SourceError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operator actions against the media server
pub struct Actions {
    server: Arc<dyn MediaServer>,
    names: Arc<UserNameCache>,
}

impl Actions {
    pub fn new(server: Arc<dyn MediaServer>, names: Arc<UserNameCache>) -> Self {
        Self { server, names }
    }

    /// Mark a movie played for a user.
    ///
    /// Names are only looked up for the log line; when a lookup fails the
    /// raw ID is logged instead.
    pub async fn mark_played(&self, movie_id: &str, user_id: &str) -> Result<(), SourceError> {
        let movie_name = self.movie_label(movie_id).await;
        let user_name = match self.names.name_of(user_id).await {
            Ok(name) => name,
            Err(e) => {
                debug!("Could not resolve user {}: {}", user_id, e);
                user_id.to_string()
            }
        };

        self.server.mark_played(movie_id, user_id).await?;
        info!("Marked '{}' as played for '{}'", movie_name, user_name);
        Ok(())
    }

    pub async fn delete_movie(&self, movie_id: &str) -> Result<(), SourceError> {
        let movie_name = self.movie_label(movie_id).await;
        self.server.delete_movie(movie_id).await?;
        info!("Deleted '{}' ({})", movie_name, movie_id);
        Ok(())
    }

    /// Fill in play counts and last-played dates for both copies of a pair.
    ///
    /// Played flags are left as reconciled. A user whose lookup fails is
    /// skipped with a warning. Returns the number of users enriched.
    pub async fn enrich_play_counts(&self, verdict: &mut DuplicateVerdict) -> usize {
        let user_ids: Vec<String> = verdict
            .movie_a
            .play_states
            .keys()
            .chain(verdict.movie_b.play_states.keys())
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut enriched = 0;
        for user_id in user_ids {
            let lookups = futures::try_join!(
                self.server.get_single_play_state(&verdict.movie_a.id, &user_id),
                self.server.get_single_play_state(&verdict.movie_b.id, &user_id),
            );
            match lookups {
                Ok((state_a, state_b)) => {
                    copy_counts(verdict.movie_a.play_states.get_mut(&user_id), state_a);
                    copy_counts(verdict.movie_b.play_states.get_mut(&user_id), state_b);
                    enriched += 1;
                }
                Err(e) => warn!(
                    "Skipping play counts of user {} for '{}': {}",
                    user_id, verdict.movie_a.name, e
                ),
            }
        }
        enriched
    }

    async fn movie_label(&self, movie_id: &str) -> String {
        match self.server.get_movie_name(movie_id).await {
            Ok(name) => name,
            Err(e) => {
                debug!("Could not resolve movie {}: {}", movie_id, e);
                movie_id.to_string()
            }
        }
    }
}

fn copy_counts(target: Option<&mut PlayState>, fetched: PlayState) {
    if let Some(state) = target {
        state.play_count = fetched.play_count;
        state.last_played = fetched.last_played;
    }
}
