use super::{connect, validate_id};
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_dedup_config::{Config, PathManager};
use media_dedup_core::Actions;
use serde_json::json;

pub async fn run_mark_played(
    config: &Config,
    paths: &PathManager,
    movie_id: &str,
    user_id: &str,
    output: &Output,
) -> Result<()> {
    validate_id("movie ID", movie_id)?;
    validate_id("user ID", user_id)?;

    let session = connect(config, paths)?;
    let actions = Actions::new(session.server.clone(), session.names.clone());

    actions.mark_played(movie_id, user_id).await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to mark {} as played for {}: {}", movie_id, user_id, e))?;

    match output.format() {
        OutputFormat::Human => {
            let user_name = session.names.name_of(user_id).await.unwrap_or_else(|_| user_id.to_string());
            output.success(format!("Marked {} as played for {}", movie_id, user_name));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": true,
                "action": "mark_played",
                "movie_id": movie_id,
                "user_id": user_id,
            }));
        }
    }

    Ok(())
}
