use crate::similarity;
use media_dedup_models::{DuplicateGroupKey, DuplicateVerdict, MovieRecord, PlayStatusDiscrepancy, UserRecord};
use std::collections::HashMap;
use tracing::debug;

/// Minimum path similarity for two copies to count as the same file
pub const DUPLICATE_SIMILARITY_THRESHOLD: u8 = 95;

/// Groups reconciled movies by (name, year) and compares every pair within a group
pub struct DuplicateEngine {
    user_names: HashMap<String, String>,
}

impl DuplicateEngine {
    pub fn new(users: &[UserRecord]) -> Self {
        Self {
            user_names: users
                .iter()
                .map(|u| (u.id.clone(), u.name.clone()))
                .collect(),
        }
    }

    /// One verdict per unordered pair of movies sharing a group key.
    ///
    /// Groups come out in no particular order; within a group pairs follow
    /// catalog order.
    pub fn find_duplicates(&self, movies: &[MovieRecord]) -> Vec<DuplicateVerdict> {
        let groups = group_by_key(movies);
        let mut verdicts = Vec::new();

        for (key, group) in groups.into_iter().filter(|(_, group)| group.len() > 1) {
            debug!("Group '{}' has {} copies", key, group.len());
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    verdicts.push(self.compare(a, b));
                }
            }
        }

        verdicts
    }

    fn compare(&self, a: &MovieRecord, b: &MovieRecord) -> DuplicateVerdict {
        let similarity = similarity::score(&a.path, &b.path);
        DuplicateVerdict {
            movie_a: a.clone(),
            movie_b: b.clone(),
            similarity,
            is_duplicate: similarity >= DUPLICATE_SIMILARITY_THRESHOLD,
            has_identical_play_status: has_identical_play_status(a, b),
            discrepancies: self.play_status_discrepancies(a, b),
        }
    }

    /// Users who played one copy but not the other, each paired with the copy
    /// they still need marked. Users who played `a` come first, then those who
    /// played `b`, each in user-ID order.
    pub fn play_status_discrepancies(&self, a: &MovieRecord, b: &MovieRecord) -> Vec<PlayStatusDiscrepancy> {
        let missing_on_b = a
            .played_user_ids()
            .filter(|user_id| !b.played_by(user_id))
            .map(|user_id| self.discrepancy(user_id, b));
        let missing_on_a = b
            .played_user_ids()
            .filter(|user_id| !a.played_by(user_id))
            .map(|user_id| self.discrepancy(user_id, a));

        missing_on_b.chain(missing_on_a).collect()
    }

    fn discrepancy(&self, user_id: &str, movie_to_update: &MovieRecord) -> PlayStatusDiscrepancy {
        PlayStatusDiscrepancy {
            user_id: user_id.to_string(),
            user_name: self
                .user_names
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| user_id.to_string()),
            movie_to_update: movie_to_update.id.clone(),
            movie_name: movie_to_update.name.clone(),
        }
    }
}

/// Whether both copies have the same users with the same played flags.
///
/// False when either copy carries no play states at all.
pub fn has_identical_play_status(a: &MovieRecord, b: &MovieRecord) -> bool {
    if a.play_states.is_empty() || b.play_states.is_empty() {
        return false;
    }
    a.play_states.len() == b.play_states.len()
        && a.play_states.iter().all(|(user_id, state)| {
            b.play_states
                .get(user_id)
                .map(|other| other.played == state.played)
                .unwrap_or(false)
        })
}

fn group_by_key(movies: &[MovieRecord]) -> HashMap<DuplicateGroupKey, Vec<&MovieRecord>> {
    let mut groups: HashMap<DuplicateGroupKey, Vec<&MovieRecord>> = HashMap::new();
    for movie in movies {
        groups.entry(DuplicateGroupKey::of(movie)).or_default().push(movie);
    }
    groups
}

/// Number of (name, year) groups with more than one copy
pub fn duplicate_group_count(movies: &[MovieRecord]) -> usize {
    group_by_key(movies).values().filter(|group| group.len() > 1).count()
}
