pub mod similarity;
pub mod catalog;
pub mod play_state;
pub mod reconcile;
pub mod duplicates;
pub mod names;
pub mod analysis;
pub mod actions;
pub mod error;
mod paging;

#[cfg(test)]
mod testing;

pub use similarity::{score, strip_extension};
pub use catalog::{CatalogFetcher, MAX_CONCURRENT_LIBRARY_FETCHES, PAGE_SIZE};
pub use play_state::{PlayStateAggregator, SeenSets, MAX_CONCURRENT_USER_FETCHES};
pub use reconcile::reconcile;
pub use duplicates::{DuplicateEngine, DUPLICATE_SIMILARITY_THRESHOLD};
pub use names::UserNameCache;
pub use analysis::{AnalysisReport, Analyzer};
pub use actions::Actions;
pub use error::RetrievalError;
