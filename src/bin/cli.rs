//! Channel collector CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use collector::{
    api::YouTubeClient,
    error::{AppError, Result},
    models::{CollectOptions, Config},
    pipeline::{self, CollectionOrchestrator},
    services::QuotaLedger,
    storage::{LocalRepository, Repository},
    utils::parse_channel_id,
};

/// Incremental YouTube channel collector
#[derive(Parser, Debug)]
#[command(
    name = "collector",
    version,
    about = "Collects channel, video and comment snapshots and reports what changed"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "collector.toml")]
    config: PathBuf,

    /// Override the storage directory from the configuration
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Stage and cap flags; unset flags fall back to the `[collect]` section.
#[derive(Args, Debug, Default)]
struct StageArgs {
    /// Fetch channel metadata
    #[arg(long)]
    channel: bool,

    /// Fetch the video list and statistics
    #[arg(long)]
    videos: bool,

    /// Fetch comments
    #[arg(long)]
    comments: bool,

    /// Run all three stages
    #[arg(long, conflicts_with_all = ["channel", "videos", "comments"])]
    all: bool,

    /// Maximum videos to list (0 = all)
    #[arg(long)]
    max_videos: Option<usize>,

    /// Maximum comments kept per video (0 = unlimited)
    #[arg(long)]
    max_comments: Option<usize>,

    /// Refresh comments of every video, not only those that are short
    #[arg(long)]
    no_optimize: bool,
}

impl StageArgs {
    fn apply(&self, defaults: &CollectOptions) -> CollectOptions {
        let mut options = defaults.clone();
        if self.all {
            options.fetch_channel_data = true;
            options.fetch_videos = true;
            options.fetch_comments = true;
        } else if self.channel || self.videos || self.comments {
            options.fetch_channel_data = self.channel;
            options.fetch_videos = self.videos;
            options.fetch_comments = self.comments;
        }
        if let Some(max) = self.max_videos {
            options.max_videos = max;
        }
        if let Some(max) = self.max_comments {
            options.max_comments_per_video = max;
        }
        if self.no_optimize {
            options.optimize_quota = false;
        }
        options
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect a channel on top of its stored snapshot
    Collect {
        /// Channel id or channel URL
        channel: String,

        #[command(flatten)]
        stages: StageArgs,
    },

    /// Show the quota a collection would need
    Estimate {
        /// Channel id or URL; its stored video count refines the estimate
        channel: Option<String>,

        #[command(flatten)]
        stages: StageArgs,
    },

    /// Show the stored snapshot of a channel
    Info {
        /// Channel id or channel URL
        channel: String,
    },

    /// List superseded snapshots of a channel
    History {
        /// Channel id or channel URL
        channel: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::load_or_default(&cli.config)
    };
    if let Some(dir) = &cli.storage_dir {
        config.storage.root = dir.clone();
    }

    let repository = LocalRepository::from_config(&config.storage);

    match cli.command {
        Command::Collect { channel, stages } => {
            config.validate()?;
            let options = stages.apply(&config.collect);
            if !options.any_stage() {
                log::warn!("No stage requested; nothing to do");
                return Ok(());
            }

            let api_key = config.api_key().ok_or_else(|| {
                AppError::config(format!(
                    "no API key: set api.key or the {} environment variable",
                    config.api.key_env
                ))
            })?;
            let client = YouTubeClient::new(&config.api, api_key)?;
            let orchestrator = CollectionOrchestrator::from_config(client, &config);

            let outcome = pipeline::run_collect(&orchestrator, &repository, &channel, &options)?;
            let snapshot = &outcome.snapshot;

            log::info!(
                "{} ({}): {} videos, {} comments, {} quota units used",
                snapshot.name,
                snapshot.channel_id,
                snapshot.videos.len(),
                snapshot.total_comments(),
                orchestrator.ledger().consumed()
            );
            if let Some(delta) = &snapshot.delta {
                println!("{}", serde_json::to_string_pretty(delta)?);
            }
            if !snapshot.is_complete() {
                log::warn!("{} stage(s) did not complete", snapshot.errors.len());
            }
        }

        Command::Estimate { channel, stages } => {
            let options = stages.apply(&config.collect);
            let known = match channel {
                Some(input) => repository
                    .get_by_id(&parse_channel_id(&input)?)?
                    .and_then(|s| s.video_count.map(|n| n as usize)),
                None => None,
            };

            let ledger = QuotaLedger::from_config(&config.quota);
            let cost = ledger.estimate_for(&options, known);
            log::info!(
                "Estimated cost: {} of {} units{}",
                cost,
                ledger.budget(),
                known.map_or(String::new(), |n| format!(" ({n} known videos)"))
            );
            println!("{cost}");
        }

        Command::Info { channel } => {
            let channel_id = parse_channel_id(&channel)?;
            log::info!("Storage directory: {}", repository.root().display());

            match repository.get_by_id(&channel_id)? {
                Some(snapshot) => {
                    log::info!("Channel: {} ({})", snapshot.name, snapshot.channel_id);
                    log::info!("Fetched at: {}", snapshot.fetched_at);
                    log::info!(
                        "Subscribers: {}",
                        snapshot
                            .subscriber_count
                            .map_or("hidden".to_string(), |n| n.to_string())
                    );
                    log::info!(
                        "Videos stored: {} ({} unavailable)",
                        snapshot.videos.len(),
                        snapshot.videos.iter().filter(|v| v.unavailable).count()
                    );
                    log::info!("Comments stored: {}", snapshot.total_comments());
                }
                None => log::warn!("No snapshot stored for {}", channel_id),
            }
        }

        Command::History { channel } => {
            let channel_id = parse_channel_id(&channel)?;
            let versions = repository.list_history(&channel_id)?;
            if versions.is_empty() {
                log::info!("No history for {}", channel_id);
            }
            for version in versions {
                println!("{version}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.api_key().is_none() {
                log::warn!(
                    "No API key configured (api.key or ${})",
                    config.api.key_env
                );
            }
            log::info!("All validations passed!");
        }
    }

    Ok(())
}
