use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Watch state of one movie for one user
///
/// `play_count` is best-effort: bulk reconciliation leaves it at 0 and only
/// single-pair enrichment fills it in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlayState {
    pub played: bool,
    pub play_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
}

impl PlayState {
    pub fn played() -> Self {
        Self {
            played: true,
            ..Self::default()
        }
    }

    pub fn unplayed() -> Self {
        Self::default()
    }
}
