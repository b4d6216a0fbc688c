pub mod traits;
pub mod jellyfin;
pub mod error;

pub use traits::{ItemPage, MediaServer};
pub use error::SourceError;
pub use jellyfin::{JellyfinClient, verify_api_key};
