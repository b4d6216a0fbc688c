use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, trace};
use urlencoding::encode;
use media_dedup_models::{Library, MovieRecord, PlayState, ProviderIds, UserRecord};
use crate::error::SourceError;

pub const TOKEN_HEADER: &str = "x-mediabrowser-token";

/// Server-side field selection for movie listings. Path, name and year drive
/// grouping and similarity; without them every verdict degrades silently.
pub const MOVIE_FIELDS: &str = "ProviderIds,ProductionYear,Path";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<BaseItemDto>,
    #[serde(default)]
    pub total_record_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewsResponse {
    #[serde(default)]
    pub items: Vec<ViewDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub collection_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseItemDto {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub provider_ids: Option<HashMap<String, String>>,
    #[serde(default)]
    pub user_data: Option<UserItemDataDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemDataDto {
    #[serde(default)]
    pub played: bool,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub last_played_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<ViewDto> for Library {
    fn from(view: ViewDto) -> Self {
        Library {
            id: view.id,
            name: view.name,
            collection_type: view.collection_type,
        }
    }
}

impl From<UserDto> for UserRecord {
    fn from(user: UserDto) -> Self {
        UserRecord {
            id: user.id,
            name: user.name,
        }
    }
}

impl From<BaseItemDto> for MovieRecord {
    fn from(item: BaseItemDto) -> Self {
        let provider_ids = item
            .provider_ids
            .map(|ids| ProviderIds {
                tmdb: provider_id(&ids, "Tmdb"),
                imdb: provider_id(&ids, "Imdb"),
            })
            .unwrap_or_default();

        let mut movie = MovieRecord::new(
            item.id,
            item.name.unwrap_or_default(),
            item.production_year.unwrap_or(0),
            item.path.unwrap_or_default(),
        );
        movie.provider_ids = provider_ids;
        movie
    }
}

impl From<UserItemDataDto> for PlayState {
    fn from(data: UserItemDataDto) -> Self {
        let last_played = data
            .last_played_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        PlayState {
            played: data.played,
            // a count on an unplayed item is stale server data
            play_count: if data.played { data.play_count } else { 0 },
            last_played,
        }
    }
}

fn provider_id(ids: &HashMap<String, String>, key: &str) -> Option<String> {
    ids.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Scope of a movie listing request
#[derive(Debug, Clone, Copy)]
pub enum MovieScope<'a> {
    Library(&'a str),
    PlayedBy(&'a str),
}

/// Query parameters for a paged, recursive movie listing
pub fn movie_query(scope: MovieScope<'_>, offset: usize, limit: usize) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("Recursive", "true".to_string()),
        ("IncludeItemTypes", "Movie".to_string()),
        ("Fields", MOVIE_FIELDS.to_string()),
    ];
    match scope {
        MovieScope::Library(library_id) => {
            query.push(("ParentId", library_id.to_string()));
        }
        MovieScope::PlayedBy(user_id) => {
            query.push(("Filters", "IsPlayed".to_string()));
            query.push(("UserId", user_id.to_string()));
        }
    }
    query.push(("StartIndex", offset.to_string()));
    query.push(("Limit", limit.to_string()));
    query
}

pub struct JellyfinHttpClient {
    client: Client,
    base_url: String,
}

impl JellyfinHttpClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static(TOKEN_HEADER),
                    reqwest::header::HeaderValue::from_str(api_key)
                        .context("Invalid API key format")?,
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, SourceError> {
        let url = self.url(path);
        trace!("Jellyfin GET {} {:?}", url, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceError::Http { url: url.clone(), source })?;

        let response = ensure_success(response, &url, |status| status.is_success()).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| SourceError::Decode { url, source })
    }

    pub async fn get_views(&self, user_id: &str) -> Result<Vec<ViewDto>, SourceError> {
        let path = format!("/Users/{}/Views", encode(user_id));
        let views: ViewsResponse = self.get_json(&path, &[]).await?;
        debug!("Jellyfin: {} views for user {}", views.items.len(), user_id);
        Ok(views.items)
    }

    pub async fn get_movies(&self, scope: MovieScope<'_>, offset: usize, limit: usize) -> Result<ItemsResponse, SourceError> {
        let query = movie_query(scope, offset, limit);
        self.get_json("/Items", &query).await
    }

    pub async fn get_users(&self) -> Result<Vec<UserDto>, SourceError> {
        self.get_json("/Users", &[]).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserDto, SourceError> {
        let path = format!("/Users/{}", encode(user_id));
        self.get_json(&path, &[]).await
    }

    /// Item as seen by a user; carries that user's `UserData`
    pub async fn get_user_item(&self, user_id: &str, item_id: &str) -> Result<BaseItemDto, SourceError> {
        let path = format!("/Users/{}/Items/{}", encode(user_id), encode(item_id));
        self.get_json(&path, &[("Fields", MOVIE_FIELDS.to_string())]).await
    }

    pub async fn post_played_item(&self, user_id: &str, item_id: &str) -> Result<(), SourceError> {
        let url = self.url(&format!("/Users/{}/PlayedItems/{}", encode(user_id), encode(item_id)));
        debug!("Jellyfin POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| SourceError::Http { url: url.clone(), source })?;

        ensure_success(response, &url, is_definitive_success).await?;
        Ok(())
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<(), SourceError> {
        let url = self.url(&format!("/Items/{}", encode(item_id)));
        debug!("Jellyfin DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|source| SourceError::Http { url: url.clone(), source })?;

        ensure_success(response, &url, is_definitive_success).await?;
        Ok(())
    }
}

/// Jellyfin answers mutations with 204, some versions with 200
fn is_definitive_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NO_CONTENT
}

async fn ensure_success<F>(response: Response, url: &str, accept: F) -> Result<Response, SourceError>
where
    F: Fn(StatusCode) -> bool,
{
    let status = response.status();
    if accept(status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_response_decodes_movies() {
        let json = r#"{
            "Items": [
                {
                    "Id": "a1",
                    "Name": "Inception",
                    "Path": "/movies/Inception (2010)/Inception.mkv",
                    "ProductionYear": 2010,
                    "ProviderIds": {"Tmdb": "27205", "Imdb": "tt1375666"},
                    "Type": "Movie"
                },
                {"Id": "b2", "Name": "Home Video"}
            ],
            "TotalRecordCount": 2,
            "StartIndex": 0
        }"#;

        let response: ItemsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_record_count, 2);

        let movies: Vec<MovieRecord> = response.items.into_iter().map(MovieRecord::from).collect();
        assert_eq!(movies[0].name, "Inception");
        assert_eq!(movies[0].production_year, 2010);
        assert_eq!(movies[0].provider_ids.imdb.as_deref(), Some("tt1375666"));
        assert!(movies[0].play_states.is_empty());

        // missing year and path degrade to defaults
        assert_eq!(movies[1].production_year, 0);
        assert_eq!(movies[1].path, "");
        assert_eq!(movies[1].provider_ids, ProviderIds::default());
    }

    #[test]
    fn test_null_fields_degrade_to_defaults() {
        let json = r#"{"Id": "c3", "Name": null, "Path": null, "ProductionYear": null, "ProviderIds": null}"#;
        let movie = MovieRecord::from(serde_json::from_str::<BaseItemDto>(json).unwrap());
        assert_eq!(movie.name, "");
        assert_eq!(movie.path, "");
        assert_eq!(movie.production_year, 0);
    }

    #[test]
    fn test_user_data_to_play_state() {
        let json = r#"{
            "Id": "a1",
            "UserData": {
                "Played": true,
                "PlayCount": 3,
                "PlaybackPositionTicks": 0,
                "LastPlayedDate": "2024-03-01T20:15:30.1234567Z"
            }
        }"#;
        let item: BaseItemDto = serde_json::from_str(json).unwrap();
        let state = PlayState::from(item.user_data.unwrap());
        assert!(state.played);
        assert_eq!(state.play_count, 3);
        assert_eq!(state.last_played.unwrap().to_rfc3339().get(..19), Some("2024-03-01T20:15:30"));
    }

    #[test]
    fn test_unplayed_user_data_zeroes_count() {
        let data = UserItemDataDto {
            played: false,
            play_count: 2,
            last_played_date: Some("not a date".to_string()),
        };
        let state = PlayState::from(data);
        assert_eq!(state, PlayState::unplayed());
    }

    #[test]
    fn test_views_and_users_decode() {
        let views: ViewsResponse = serde_json::from_str(
            r#"{"Items": [{"Id": "lib1", "Name": "Movies", "CollectionType": "movies"}]}"#,
        )
        .unwrap();
        let library = Library::from(views.items.into_iter().next().unwrap());
        assert_eq!(library.collection_type.as_deref(), Some("movies"));

        let users: Vec<UserDto> = serde_json::from_str(
            r#"[{"Id": "u1", "Name": "alice", "HasPassword": true}, {"Id": "u2", "Name": "bob"}]"#,
        )
        .unwrap();
        let users: Vec<UserRecord> = users.into_iter().map(UserRecord::from).collect();
        assert_eq!(users[1], UserRecord { id: "u2".to_string(), name: "bob".to_string() });
    }

    #[test]
    fn test_library_query_selects_required_fields() {
        let query = movie_query(MovieScope::Library("lib1"), 200, 100);
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("Fields"), Some("ProviderIds,ProductionYear,Path"));
        assert_eq!(get("ParentId"), Some("lib1"));
        assert_eq!(get("StartIndex"), Some("200"));
        assert_eq!(get("Limit"), Some("100"));
        assert_eq!(get("Filters"), None);
    }

    #[test]
    fn test_played_query_filters_by_user() {
        let query = movie_query(MovieScope::PlayedBy("u1"), 0, 100);
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("Filters"), Some("IsPlayed"));
        assert_eq!(get("UserId"), Some("u1"));
        assert_eq!(get("ParentId"), None);
        assert_eq!(get("IncludeItemTypes"), Some("Movie"));
    }

    #[test]
    fn test_definitive_success_statuses() {
        assert!(is_definitive_success(StatusCode::OK));
        assert!(is_definitive_success(StatusCode::NO_CONTENT));
        assert!(!is_definitive_success(StatusCode::ACCEPTED));
        assert!(!is_definitive_success(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = JellyfinHttpClient::new("http://jf.local:8096/", "key").unwrap();
        assert_eq!(client.base_url(), "http://jf.local:8096");
        assert_eq!(client.url("/Users"), "http://jf.local:8096/Users");
    }

    #[test]
    fn test_new_rejects_invalid_key() {
        assert!(JellyfinHttpClient::new("http://jf.local", "bad\nkey").is_err());
    }
}
