use thiserror::Error;

/// Failure of a single call against the media server
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server reported more items than it was willing to return
    #[error("listing ended at {received} of {total} reported items")]
    TruncatedListing { received: usize, total: usize },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } | Self::Decode { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
