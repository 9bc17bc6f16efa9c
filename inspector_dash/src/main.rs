//! Request Inspector dashboard - watch requests captured by an inspection backend
//!
//! Usage:
//!   inspector-dash [watch]            Live dashboard (TUI)
//!   inspector-dash watch --no-tui     Live feed as plain log lines
//!   inspector-dash snapshot           Print the requests stored so far
//!   inspector-dash config             Show or update saved settings

mod card;
mod commands;
mod config;
mod dashboard;
mod feed;
mod live;
mod platform;
mod presentation;
mod snapshot;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "inspector-dash")]
#[command(author = "Request Inspector Team")]
#[command(version)]
#[command(about = "Watch HTTP requests captured by a request inspection backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Inspection backend base URL
    #[arg(long, global = true, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard: stored requests plus new ones as they arrive
    Watch {
        /// Print plain log lines instead of the full-screen dashboard
        #[arg(long)]
        no_tui: bool,

        /// Keep at most this many requests in the feed
        #[arg(long)]
        max_requests: Option<usize>,
    },

    /// Print the requests the backend has stored
    Snapshot {
        /// Print raw JSON records
        #[arg(long, conflicts_with = "full")]
        json: bool,

        /// Print every field and body of each request
        #[arg(long)]
        full: bool,

        /// Print at most this many requests, newest first
        #[arg(long)]
        max_requests: Option<usize>,
    },

    /// Show or update saved settings
    Config {
        /// Save this backend URL as the default
        #[arg(long)]
        set_backend_url: Option<String>,

        /// Save a default feed capacity
        #[arg(long, conflicts_with = "unbounded")]
        set_max_requests: Option<usize>,

        /// Clear the saved feed capacity
        #[arg(long)]
        unbounded: bool,
    },
}

/// Where log output goes
#[derive(Clone, Copy, PartialEq, Eq)]
enum LogTarget {
    Stderr,
    /// The TUI owns the terminal, so logs go to a file
    File,
}

fn init_logging(verbose: bool, target: LogTarget) -> Result<()> {
    let log_level = if verbose { "debug" } else { "warn" };
    let crate_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},inspector_dash={}", log_level, crate_level).into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .without_time()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogTarget::File => {
            config::ensure_dirs()?;
            let path = config::log_file();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may provide BACKEND_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Watch {
        no_tui: false,
        max_requests: None,
    });

    let log_target = match &command {
        Commands::Watch { no_tui: false, .. } => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    init_logging(cli.verbose, log_target)?;

    let file = config::Config::load()?;

    // Handle commands
    match command {
        Commands::Watch {
            no_tui,
            max_requests,
        } => {
            let settings = file.resolve(cli.backend_url, max_requests)?;
            tracing::info!("Watching {}", settings.backend_url);
            let opts = commands::watch::WatchOptions {
                settings,
                tui: !no_tui,
            };
            commands::watch::run(opts).await?;
        }

        Commands::Snapshot {
            json,
            full,
            max_requests,
        } => {
            let settings = file.resolve(cli.backend_url, max_requests)?;
            let format = if json {
                commands::snapshot::SnapshotFormat::Json
            } else if full {
                commands::snapshot::SnapshotFormat::Cards
            } else {
                commands::snapshot::SnapshotFormat::Lines
            };
            commands::snapshot::run(settings, format).await?;
        }

        Commands::Config {
            set_backend_url,
            set_max_requests,
            unbounded,
        } => {
            let update = commands::config::ConfigUpdate {
                backend_url: set_backend_url,
                feed_capacity: set_max_requests,
                unbounded,
            };
            commands::config::run(update, cli.backend_url).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_for(args: &[&str], file: &config::Config) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        file.resolve(cli.backend_url, None).unwrap().backend_url
    }

    // One test owns BACKEND_URL so parallel tests never race on it
    #[test]
    fn test_backend_url_precedence() {
        let empty = config::Config::default();
        let saved = config::Config {
            backend_url: Some("http://file:5000".to_string()),
            ..Default::default()
        };

        std::env::remove_var("BACKEND_URL");
        assert_eq!(
            backend_for(&["inspector-dash", "snapshot"], &empty),
            "http://localhost:5000"
        );
        assert_eq!(
            backend_for(&["inspector-dash", "snapshot"], &saved),
            "http://file:5000"
        );

        std::env::set_var("BACKEND_URL", "http://env:5000");
        assert_eq!(
            backend_for(&["inspector-dash", "snapshot"], &saved),
            "http://env:5000"
        );
        assert_eq!(
            backend_for(
                &["inspector-dash", "--backend-url", "http://cli:5000", "snapshot"],
                &saved
            ),
            "http://cli:5000"
        );
        assert_eq!(
            backend_for(
                &["inspector-dash", "config", "--backend-url", "http://cli:5000"],
                &saved
            ),
            "http://cli:5000"
        );

        std::env::remove_var("BACKEND_URL");
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["inspector-dash", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
