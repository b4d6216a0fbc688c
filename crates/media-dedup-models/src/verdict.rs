use serde::{Deserialize, Serialize};
use std::fmt;
use crate::movie::MovieRecord;

/// Grouping key for duplicate detection: exact name and production year
///
/// No case folding or whitespace normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DuplicateGroupKey {
    pub name: String,
    pub production_year: i32,
}

impl DuplicateGroupKey {
    pub fn of(movie: &MovieRecord) -> Self {
        Self {
            name: movie.name.clone(),
            production_year: movie.production_year,
        }
    }
}

impl fmt::Display for DuplicateGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.production_year)
    }
}

/// A user who watched one copy of a pair but not the other
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlayStatusDiscrepancy {
    pub user_id: String,
    pub user_name: String,
    /// ID of the copy that should be marked played for this user
    pub movie_to_update: String,
    pub movie_name: String,
}

/// Comparison result for one pair of movies sharing a group key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateVerdict {
    pub movie_a: MovieRecord,
    pub movie_b: MovieRecord,
    pub similarity: u8,
    pub is_duplicate: bool,
    pub has_identical_play_status: bool,
    #[serde(default)]
    pub discrepancies: Vec<PlayStatusDiscrepancy>,
}

impl DuplicateVerdict {
    pub fn has_play_status_discrepancy(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    /// Informal operator guidance: deleting either copy loses no watch history
    pub fn is_safe_to_delete(&self) -> bool {
        self.has_identical_play_status
    }

    pub fn group_key(&self) -> DuplicateGroupKey {
        DuplicateGroupKey::of(&self.movie_a)
    }

    /// True if the verdict compares the two given movie IDs, in either order
    pub fn involves(&self, id_a: &str, id_b: &str) -> bool {
        (self.movie_a.id == id_a && self.movie_b.id == id_b)
            || (self.movie_a.id == id_b && self.movie_b.id == id_a)
    }
}
