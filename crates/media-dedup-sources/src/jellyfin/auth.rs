use anyhow::Result;
use reqwest::Client;
use tracing::debug;
use super::api::TOKEN_HEADER;

/// Verify that an API key is accepted by the server
pub async fn verify_api_key(base_url: &str, api_key: &str) -> Result<bool> {
    let client = Client::new();
    let url = format!("{}/System/Info", base_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .header(TOKEN_HEADER, api_key)
        .header("Accept", "application/json")
        .send()
        .await?;

    debug!("Jellyfin key check against {}: {}", url, response.status());
    Ok(response.status().is_success())
}
