pub mod library;
pub mod movie;
pub mod play_state;
pub mod user;
pub mod verdict;

pub use library::Library;
pub use movie::{MovieRecord, ProviderIds};
pub use play_state::PlayState;
pub use user::UserRecord;
pub use verdict::{DuplicateGroupKey, DuplicateVerdict, PlayStatusDiscrepancy};
