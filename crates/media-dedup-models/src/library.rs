use serde::{Deserialize, Serialize};

/// A top-level library (view) visible to the configured account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Library {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>, // "movies", "tvshows", "boxsets", ...
}
