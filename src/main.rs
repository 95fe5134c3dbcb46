// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use novelplay::app_config::{self, Config, PlayMode};
use novelplay::app_controller::{Controller, RunOptions};
use novelplay::scenario::SceneId;

/// CLI Wrapper for PlayMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPlayMode {
    Auto,
    Manual,
}

impl From<CliPlayMode> for PlayMode {
    fn from(cli_mode: CliPlayMode) -> Self {
        match cli_mode {
            CliPlayMode::Auto => PlayMode::Auto,
            CliPlayMode::Manual => PlayMode::Manual,
        }
    }
}

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
    /// Play a scenario headlessly, printing subtitles as they appear
    Play(PlayArgs),

    /// Print an outline of a scenario and any problems found in it
    Inspect {
        /// Scenario JSON file
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,
    },

    /// Generate shell completions for novelplay
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Scenario JSON file
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Scene advancement mode
    #[arg(short, long, value_enum)]
    mode: Option<CliPlayMode>,

    /// Run on a simulated clock instead of wall time
    #[arg(short, long)]
    fast: bool,

    /// Scene id to start from
    #[arg(short, long)]
    start_scene: Option<SceneId>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// novelplay - scene playback engine for visual novels
///
/// Plays scenario documents made of timed scenes with narration, music,
/// sound effects and subtitles.
#[derive(Parser, Debug)]
#[command(name = "novelplay")]
#[command(version)]
#[command(about = "Scene playback engine for visual novels")]
#[command(long_about = "novelplay plays scenario documents: ordered scenes with a background, audio tracks and timed subtitles.

EXAMPLES:
    novelplay play story.json                  # Play with wall-clock timing
    novelplay play --fast story.json           # Play on a simulated clock
    novelplay play -m manual story.json        # Wait for Enter after each scene
    novelplay play -s 3 story.json             # Start at scene 3
    novelplay inspect story.json               # Outline the scenario
    novelplay completions bash > novelplay.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the logger ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "novelplay", &mut std::io::stdout());
            Ok(())
        }
        Commands::Inspect { scenario } => {
            let controller = Controller::with_config(Config::default())?;
            for line in controller.inspect(&scenario)? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Play(args) => run_play(args).await,
    }
}

async fn run_play(options: PlayArgs) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path)?;

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let run_options = RunOptions {
        fast: options.fast,
        mode: options.mode.map(Into::into),
        start_scene: options.start_scene,
        max_frames: options.max_frames,
        ..RunOptions::default()
    };

    let summary = controller.run(&options.scenario, &run_options).await?;
    if !summary.reached_end {
        warn!("Playback stopped before the end of the story");
    }
    Ok(())
}

// Load the configuration, writing a default one when the file is missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.save_to_file(config_path)?;
    info!("Default configuration written to {}", config_path);
    Ok(config)
}
