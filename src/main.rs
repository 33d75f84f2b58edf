// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::database::{DatabaseConnection, Repository};
use crate::engines::EngineSet;
use crate::engines::classifier::ZeroShotClassifier;
use crate::engines::nllb::NllbEngine;
use crate::engines::whisper::WhisperEngine;
use crate::pipeline::Coordinator;
use crate::work_selector::SelectionOptions;

mod app_config;
mod database;
mod engines;
mod errors;
mod fetcher;
mod file_utils;
mod language_utils;
mod pipeline;
mod subtitle;
mod tagging;
mod translation_stage;
mod work_selector;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate subtitles and tags for pending videos (default command)
    #[command(alias = "run")]
    Run(RunArgs),

    /// Generate shell completions for polysub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Process exactly one video, given as author/permlink
    #[arg(short, long, value_name = "AUTHOR/PERMLINK")]
    only: Option<String>,

    /// Reprocess all configured languages even when records exist
    #[arg(short, long)]
    force: bool,

    /// Earliest video creation date to consider (RFC 3339)
    #[arg(short, long)]
    start_date: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// polysub - multilingual subtitle generation for stored videos
///
/// Fetches pending videos from content gateways, transcribes them,
/// translates the transcript into the configured languages, tags the
/// content, and records everything in a local metadata store.
#[derive(Parser, Debug)]
#[command(name = "polysub")]
#[command(version = "1.0.0")]
#[command(about = "Multilingual subtitle and tag generation for stored videos")]
#[command(long_about = "polysub turns stored video references into SRT subtitle files in multiple
languages plus content tags, never re-downloading or reprocessing completed work.

EXAMPLES:
    polysub                                   # Process everything pending
    polysub -f                                # Reprocess even recorded languages
    polysub --only alice/my-video             # Process a single video
    polysub --start-date 2026-01-01T00:00:00Z # Ignore older videos
    polysub --log-level debug                 # Verbose logging
    polysub completions bash > polysub.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Process exactly one video, given as author/permlink
    #[arg(short, long, value_name = "AUTHOR/PERMLINK")]
    only: Option<String>,

    /// Reprocess all configured languages even when records exist
    #[arg(short, long)]
    force: bool,

    /// Earliest video creation date to consider (RFC 3339)
    #[arg(short, long)]
    start_date: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "polysub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run(args)) => run_pipeline(args).await,
        None => {
            // Default behavior - use top-level args
            let args = RunArgs {
                only: cli.only,
                force: cli.force,
                start_date: cli.start_date,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_pipeline(args).await
        }
    }
}

async fn run_pipeline(options: RunArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)
            .context(format!("Failed to load config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(start_date) = &options.start_date {
        config.processing.start_date = Some(start_date.clone());
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    // Open the metadata store
    let connection = if config.database.path.is_empty() {
        DatabaseConnection::new_default()?
    } else {
        DatabaseConnection::new(&config.database.path)?
    };
    let repository = Repository::new(connection);

    // Construct the engine singletons
    let engines = EngineSet {
        transcriber: Arc::new(WhisperEngine::new(&config.engines.transcription)),
        translator: Arc::new(NllbEngine::new(&config.engines.translation)),
        classifier: Arc::new(ZeroShotClassifier::new(&config.engines.classification)),
    };

    let selection = SelectionOptions {
        start_date: config.processing.start_date.clone(),
        force: options.force,
        only: options.only.as_deref().map(parse_video_id).transpose()?,
    };

    let coordinator = Coordinator::new(config, engines, repository)?;
    let summary = coordinator.run(&selection).await?;

    info!("{}", summary);
    Ok(())
}

/// Parse an `author/permlink` argument
fn parse_video_id(value: &str) -> Result<(String, String)> {
    match value.split_once('/') {
        Some((author, permlink)) if !author.is_empty() && !permlink.is_empty() => {
            Ok((author.to_string(), permlink.to_string()))
        }
        _ => Err(anyhow!("Expected AUTHOR/PERMLINK, got: {}", value)),
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}
