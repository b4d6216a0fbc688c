use super::progress::ProgressUI;
use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use media_dedup_config::{Config, CredentialStore, PathManager, ENV_JELLYFIN_API_KEY};
use media_dedup_sources::verify_api_key;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, paths, output),
        ConfigCommands::Jellyfin { url, user_id, api_key } => configure_jellyfin(url, user_id, api_key, paths, output).await,
    }
}

fn show_config(full: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'jellydupe config jellyfin' to create it.");
    }

    // Show what a run would actually use, environment overrides included
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.apply_env_overrides();

    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    let api_key = cred_store.resolve_jellyfin_api_key().unwrap_or_default();
    let api_key_display = if full { api_key.clone() } else { mask_string(&api_key) };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            let mut files = Table::new();
            files.set_header(vec![
                Cell::new("Config File").add_attribute(Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            files.add_row(vec![
                Cell::new("Credentials File").add_attribute(Attribute::Bold),
                Cell::new(credentials_file.display().to_string()),
            ]);
            println!("{}", styled(files));
            println!();

            let mut jellyfin = Table::new();
            jellyfin.set_header(vec![
                Cell::new("Jellyfin").fg(Color::Cyan).add_attribute(Attribute::Bold),
            ]);
            jellyfin.add_row(vec![Cell::new("URL"), Cell::new(or_not_set(&config.jellyfin.url))]);
            jellyfin.add_row(vec![Cell::new("Admin User ID"), Cell::new(or_not_set(&config.jellyfin.user_id))]);
            jellyfin.add_row(vec![Cell::new("API Key"), Cell::new(api_key_display)]);
            let status = if config.is_jellyfin_configured() && !api_key.is_empty() {
                "✓".green().to_string()
            } else {
                "✗".red().to_string()
            };
            jellyfin.add_row(vec![Cell::new("Ready"), Cell::new(status)]);
            println!("{}", styled(jellyfin));
            println!();

            let mut logging = Table::new();
            logging.set_header(vec![
                Cell::new("Logging").fg(Color::Cyan).add_attribute(Attribute::Bold),
            ]);
            logging.add_row(vec![Cell::new("Level"), Cell::new(&config.logging.level)]);
            logging.add_row(vec![Cell::new("JSON"), Cell::new(config.logging.json.to_string())]);
            let file = config.logging.file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "stderr".to_string());
            logging.add_row(vec![Cell::new("File"), Cell::new(file)]);
            println!("{}", styled(logging));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "credentials_file": credentials_file.display().to_string(),
                "jellyfin": {
                    "url": config.jellyfin.url,
                    "user_id": config.jellyfin.user_id,
                    "api_key": api_key_display,
                },
                "logging": {
                    "level": config.logging.level,
                    "json": config.logging.json,
                    "file": config.logging.file,
                },
            }));
        }
    }

    Ok(())
}

async fn configure_jellyfin(
    url_arg: Option<String>,
    user_id_arg: Option<String>,
    api_key_arg: Option<String>,
    paths: &PathManager,
    output: &Output,
) -> Result<()> {
    paths.ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    // Saved without environment overrides so they never leak into the file
    let config_file = paths.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let credentials_file = paths.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

    let url = match url_arg {
        Some(url) => url,
        None => prompts::prompt_string("Jellyfin URL", non_empty(&config.jellyfin.url))?,
    };
    let user_id = match user_id_arg {
        Some(id) => id,
        None => prompts::prompt_string("Admin user ID", non_empty(&config.jellyfin.user_id))?,
    };

    config.jellyfin.url = url.trim().trim_end_matches('/').to_string();
    config.jellyfin.user_id = user_id.trim().to_string();
    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let api_key = match api_key_arg {
        Some(key) => key,
        None => {
            let existing = cred_store.get_jellyfin_api_key().cloned();
            let hint = if existing.is_some() { "Jellyfin API key (Enter keeps the current key)" } else { "Jellyfin API key" };
            let input = prompts::prompt_secret(hint)?;
            match (input.trim().is_empty(), existing) {
                (true, Some(current)) => current,
                _ => input,
            }
        }
    };
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "Jellyfin API key is required (create one under Dashboard > API Keys, or set {})",
            ENV_JELLYFIN_API_KEY
        ));
    }

    let ui = ProgressUI::new("Verifying API key...", output.is_human());
    let verified = verify_api_key(&config.jellyfin.url, &api_key).await;
    ui.finish();
    match verified {
        Ok(true) => output.success("API key verified"),
        Ok(false) => {
            output.warn("The server rejected the API key.");
            if !prompts::prompt_yes_no("Save it anyway?", Some(false))? {
                return Err(color_eyre::eyre::eyre!("API key verification failed"));
            }
        }
        Err(e) => output.warn(format!("Could not reach {}: {}. Saving anyway.", config.jellyfin.url, e)),
    }

    config.save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    cred_store.set_jellyfin_api_key(api_key);
    cred_store.save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", credentials_file.display(), e))?;

    output.success("Jellyfin configuration saved!");
    output.println(format!("  URL: {}", config.jellyfin.url));
    output.println(format!("  Admin user ID: {}", config.jellyfin.user_id));

    Ok(())
}

fn styled(mut table: Table) -> Table {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn or_not_set(value: &str) -> String {
    non_empty(value).map(str::to_string).unwrap_or_else(|| "<not set>".to_string())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
