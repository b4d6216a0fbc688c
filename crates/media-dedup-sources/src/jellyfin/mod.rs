pub mod api;
pub mod auth;
pub mod client;

pub use auth::verify_api_key;
pub use client::JellyfinClient;
