use clap::{ArgAction, Parser, Subcommand};
use commands::{analyze, config, delete, mark_played};
use media_dedup_config::{Config, PathManager};
use std::io::IsTerminal;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "jellydupe")]
#[command(about = "jellydupe - Find duplicate movies on a Jellyfin server without losing anyone's watch history")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the library for duplicate movies
    #[command(long_about = "Fetch every movie and every user's played items from Jellyfin, group movies by title and year, and report which copies are the same file and whose watch history differs between them.")]
    Analyze {
        /// Only report copies whose paths match (safe-to-dedupe candidates)
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "mismatches_only")]
        duplicates_only: bool,

        /// Only report same-title copies whose paths differ
        #[arg(long, action = ArgAction::SetTrue)]
        mismatches_only: bool,

        /// Look up exact play counts for every reported pair (one request per user and copy)
        #[arg(long, action = ArgAction::SetTrue)]
        enrich: bool,

        /// Also write the verdicts to a CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
    /// Mark a movie as played for a user
    #[command(long_about = "Mark one copy of a movie as played for a user, typically to carry watch history over before deleting the other copy.")]
    MarkPlayed {
        /// Jellyfin item ID of the movie
        #[arg(long)]
        movie_id: String,

        /// Jellyfin user ID
        #[arg(long)]
        user_id: String,
    },
    /// Delete a movie from the server
    #[command(long_about = "Delete a movie item from Jellyfin. Depending on server settings this also removes the media file from disk.")]
    Delete {
        /// Jellyfin item ID of the movie
        #[arg(long)]
        movie_id: String,

        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// View or change configuration
    #[command(long_about = "Manage the Jellyfin connection. The API key is stored in the credentials file, never in config.toml.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Jellyfin connection
    #[command(long_about = "Configure the Jellyfin server URL, the admin user whose libraries are analyzed, and the API key. Values not given as flags are prompted for.")]
    Jellyfin {
        /// Server URL, e.g. http://jellyfin.local:8096
        #[arg(long)]
        url: Option<String>,

        /// ID of the account whose libraries are analyzed
        #[arg(long)]
        user_id: Option<String>,

        /// API key (prompted for without echo if omitted)
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn logging_options(cli: &Cli, config: &Config) -> logging::LoggingOptions {
    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or(config.logging.json || !std::io::stderr().is_terminal());

    logging::LoggingOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        default_level: config.logging.level.clone(),
        json,
        file: config.logging.file.clone(),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_file = paths.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.apply_env_overrides();

    logging::init_logging(&logging_options(&cli, &config))
        .map_err(|e| color_eyre::eyre::eyre!("Failed to initialize logging: {}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Analyze { duplicates_only, mismatches_only, enrich, csv } => {
            let options = analyze::AnalyzeOptions {
                view: analyze::View::from_flags(duplicates_only, mismatches_only),
                enrich,
                csv,
            };
            analyze::run_analyze(&config, &paths, options, &output).await
        }
        Commands::MarkPlayed { movie_id, user_id } => {
            mark_played::run_mark_played(&config, &paths, &movie_id, &user_id, &output).await
        }
        Commands::Delete { movie_id, yes } => {
            delete::run_delete(&config, &paths, &movie_id, yes, &output).await
        }
        Commands::Config { cmd } => config::run_config(cmd, &paths, &output).await,
    }
}
