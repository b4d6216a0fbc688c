use crate::play_state::SeenSets;
use media_dedup_models::{MovieRecord, PlayState, UserRecord};
use std::collections::HashSet;
use tracing::debug;

/// Attach one play state per known user to every movie.
///
/// A movie is played for a user iff the user's seen set contains its ID.
/// Play counts are left at zero. Users missing from `seen` count as having
/// played nothing. A movie listed by several libraries is kept once, first
/// occurrence wins.
pub fn reconcile(movies: Vec<MovieRecord>, seen: &SeenSets, users: &[UserRecord]) -> Vec<MovieRecord> {
    let mut known_ids = HashSet::with_capacity(movies.len());
    let mut reconciled = Vec::with_capacity(movies.len());

    for mut movie in movies {
        if !known_ids.insert(movie.id.clone()) {
            debug!("Skipping repeated catalog entry {} ('{}')", movie.id, movie.name);
            continue;
        }

        movie.play_states = users
            .iter()
            .map(|user| {
                let played = seen
                    .get(&user.id)
                    .map(|ids| ids.contains(&movie.id))
                    .unwrap_or(false);
                let state = if played { PlayState::played() } else { PlayState::unplayed() };
                (user.id.clone(), state)
            })
            .collect();
        reconciled.push(movie);
    }

    reconciled
}
