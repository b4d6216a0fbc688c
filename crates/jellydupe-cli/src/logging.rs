use anyhow::Result;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Everything `init_logging` needs, resolved from flags and config by the caller
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub verbose: u8,
    pub quiet: bool,
    /// Level used when neither `-v` nor `RUST_LOG` says otherwise
    pub default_level: String,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl LoggingOptions {
    /// Filter directive for the flags alone; `None` defers to `RUST_LOG` or the default level
    fn flag_directive(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => None,
            // -v: debug, but keep hyper's connection chatter out
            1 => Some("debug,hyper::proto::h1=warn,hyper::client::pool=warn"),
            _ => Some("trace"),
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("error");
        }
        let fallback = self.flag_directive().unwrap_or(self.default_level.as_str());
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    }
}

/// Split "dir/jellydupe.log" into the rotation directory and file prefix
fn rotation_target(log_path: &std::path::Path) -> Result<(PathBuf, String)> {
    let log_dir = log_path.parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let log_filename = log_path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    // Files rotate as jellydupe.2026-01-17 etc.
    let log_prefix = log_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(log_filename);

    Ok((log_dir.to_path_buf(), log_prefix.to_string()))
}

pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let registry = Registry::default().with(options.filter());

    // Log to a daily-rotated file when one is configured, otherwise to stderr
    if let Some(log_path) = &options.file {
        let (log_dir, log_prefix) = rotation_target(log_path)?;
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if options.json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);

            registry.with(json_layer).try_init()?;
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);

            registry.with(fmt_layer).try_init()?;
        }
    } else if options.json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);

        registry.with(json_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);

        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}
