use media_dedup_sources::SourceError;
use thiserror::Error;

/// A retrieval step of the analysis pipeline failed
///
/// Always fatal to the enclosing fetch: partial catalogs and partial
/// play-state maps are never returned.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to list libraries for account {account}")]
    Libraries {
        account: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to fetch movies of library '{library_name}' ({library_id})")]
    Library {
        library_id: String,
        library_name: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to list users")]
    Users {
        #[source]
        source: SourceError,
    },

    #[error("failed to fetch played items of user '{user_name}' ({user_id})")]
    PlayedItems {
        user_id: String,
        user_name: String,
        #[source]
        source: SourceError,
    },
}

impl RetrievalError {
    /// The underlying collaborator error
    pub fn source_error(&self) -> &SourceError {
        match self {
            Self::Libraries { source, .. }
            | Self::Library { source, .. }
            | Self::Users { source }
            | Self::PlayedItems { source, .. } => source,
        }
    }
}
