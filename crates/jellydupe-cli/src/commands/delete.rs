use super::progress::is_interactive;
use super::{connect, prompts, validate_id};
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_dedup_config::{Config, PathManager};
use media_dedup_core::Actions;
use serde_json::json;

pub async fn run_delete(
    config: &Config,
    paths: &PathManager,
    movie_id: &str,
    yes: bool,
    output: &Output,
) -> Result<()> {
    validate_id("movie ID", movie_id)?;

    let session = connect(config, paths)?;

    if !yes {
        if !is_interactive() {
            return Err(color_eyre::eyre::eyre!(
                "Refusing to delete {} without confirmation; pass --yes when not running in a terminal",
                movie_id
            ));
        }
        let name = session.server.get_movie_name(movie_id).await.unwrap_or_else(|_| movie_id.to_string());
        let prompt = format!("Delete '{}' ({})? Jellyfin may also remove the file from disk", name, movie_id);
        if !prompts::prompt_yes_no(&prompt, Some(false))? {
            output.warn("Delete cancelled");
            return Ok(());
        }
    }

    let actions = Actions::new(session.server.clone(), session.names.clone());
    actions.delete_movie(movie_id).await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to delete {}: {}", movie_id, e))?;

    match output.format() {
        OutputFormat::Human => output.success(format!("Deleted {}", movie_id)),
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": true,
                "action": "delete",
                "movie_id": movie_id,
            }));
        }
    }

    Ok(())
}
