//! Leaderboard Sync CLI
//!
//! Local host for the engine: runs sessions until Ctrl-C, or single cycles.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use leaderboard_sync::{
    error::Result,
    models::{Config, EventType, SessionOverrides, catalog},
    pipeline::{self, Engine, EngineEvent},
};

/// Leaderboard Sync - race overlay snapshot publisher
#[derive(Parser, Debug)]
#[command(
    name = "leaderboard-sync",
    version,
    about = "Polls race leaderboards and publishes overlay snapshots"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "leaderboard-sync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Append log lines to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll until interrupted with Ctrl-C
    Run(SessionArgs),

    /// Run a single cycle and exit
    Once(SessionArgs),

    /// Validate the configuration file
    Validate,

    /// Print the category catalog for the configured session
    Categories(SessionArgs),
}

/// Session settings that override the configuration file.
#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Primary race ID
    #[arg(long)]
    race_id: Option<String>,

    /// Weekend race ID used for the overall views
    #[arg(long)]
    weekend_race_id: Option<String>,

    /// Roster CSV file
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Directory the overlay reads snapshots from
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Include the sector time views
    #[arg(long)]
    sector_time: Option<bool>,

    /// Include the hill time views
    #[arg(long)]
    hill_time: Option<bool>,

    /// race, training or combined
    #[arg(long)]
    event_type: Option<EventType>,

    /// Start lanes URL or file path (empty string disables)
    #[arg(long)]
    start_lanes: Option<String>,

    /// Sort lanes within a moto in ascending order
    #[arg(long)]
    lanes_ascending: Option<bool>,

    /// Riders per category in the digest
    #[arg(long)]
    top_riders: Option<usize>,
}

impl From<SessionArgs> for SessionOverrides {
    fn from(args: SessionArgs) -> Self {
        Self {
            race_id: args.race_id,
            weekend_race_id: args.weekend_race_id,
            roster_file: args.roster,
            output_dir: args.output_dir,
            include_sector_time: args.sector_time,
            include_hill_time: args.hill_time,
            event_type: args.event_type,
            start_lanes_source: args.start_lanes,
            start_lanes_ascending: args.lanes_ascending,
            top_riders: args.top_riders,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(open_log_file(path)?)));
    }
    builder.init();
    Ok(())
}

/// Open a log file for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    log::info!("Leaderboard Sync starting...");

    let mut config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run(args) => {
            let handle = Engine::spawn(config)?;
            let mut events = handle.subscribe();
            handle.start(args.into());

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Interrupted, stopping session...");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(EngineEvent::StartFailed { reason }) => {
                            log::error!("Session did not start: {}", reason);
                            break;
                        }
                        Ok(EngineEvent::CycleCompleted(report)) => {
                            log::debug!("Cycle finished at {}", report.finished_at);
                        }
                        Ok(_) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            log::debug!("Skipped {} engine events", n);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            handle.stop();
            handle.shutdown().await?;
        }

        Command::Once(args) => {
            config.session.apply(args.into());
            let report = pipeline::run_once(&config).await?;
            log::info!(
                "Wrote {} files ({} write failures, {} failed fetches)",
                report.files_written,
                report.write_failures,
                report.failed_fetches
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Engine settings OK");

            if let Err(e) = config.session.validate() {
                log::warn!("Session settings incomplete: {}", e);
                log::warn!("Supply the missing values as overrides when starting.");
            } else {
                log::info!("✓ Session settings OK");
            }

            log::info!("All validations passed!");
        }

        Command::Categories(args) => {
            config.session.apply(args.into());
            for category in catalog(&config.session) {
                let url = category.url(&config.http, &config.session)?;
                println!("{:<28} {:<32} {}", category.label, category.file_name(), url);
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
