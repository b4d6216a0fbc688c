use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::play_state::PlayState;

/// External identifiers reported by the media server (display only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProviderIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
}

/// A movie item from the catalog
///
/// `play_states` is empty when the record leaves the catalog fetcher and holds
/// exactly one entry per known user once reconciled. Keyed by user ID, so
/// iteration order is stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieRecord {
    pub id: String,
    pub name: String,
    /// 0 when the server has no production year for the item
    pub production_year: i32,
    pub path: String,
    #[serde(default)]
    pub provider_ids: ProviderIds,
    #[serde(default)]
    pub play_states: BTreeMap<String, PlayState>,
}

impl MovieRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, production_year: i32, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            production_year,
            path: path.into(),
            provider_ids: ProviderIds::default(),
            play_states: BTreeMap::new(),
        }
    }

    pub fn play_state(&self, user_id: &str) -> Option<&PlayState> {
        self.play_states.get(user_id)
    }

    /// True only when a play-state entry exists for the user and says played
    pub fn played_by(&self, user_id: &str) -> bool {
        self.play_states.get(user_id).map(|s| s.played).unwrap_or(false)
    }

    /// IDs of users who have played this movie, in user-ID order
    pub fn played_user_ids(&self) -> impl Iterator<Item = &str> {
        self.play_states
            .iter()
            .filter(|(_, state)| state.played)
            .map(|(user_id, _)| user_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_played_by_requires_entry() {
        let mut movie = MovieRecord::new("m1", "Alien", 1979, "/movies/alien.mkv");
        assert!(!movie.played_by("u1"));

        movie.play_states.insert("u1".to_string(), PlayState::played());
        movie.play_states.insert("u2".to_string(), PlayState::unplayed());
        assert!(movie.played_by("u1"));
        assert!(!movie.played_by("u2"));
        assert_eq!(movie.played_user_ids().collect::<Vec<_>>(), vec!["u1"]);
    }

    #[test]
    fn test_serialization_skips_empty_provider_ids() {
        let movie = MovieRecord::new("m1", "Alien", 1979, "/movies/alien.mkv");
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["production_year"], 1979);
        assert_eq!(json["provider_ids"], serde_json::json!({}));
        assert_eq!(json["play_states"], serde_json::json!({}));
    }
}
