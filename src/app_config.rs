use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the player configuration including loading,
/// validating and saving configuration settings. The configuration is
/// handed to the engine at construction; nothing here is global.
/// Represents the player configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Playback policy
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Audio mix defaults
    #[serde(default)]
    pub audio: AudioConfig,

    /// Asset resolution
    #[serde(default)]
    pub assets: AssetConfig,

    /// Save slots
    #[serde(default)]
    pub saves: SaveConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Scene advancement policy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    // @mode: Advance when a scene ends
    #[default]
    Auto,
    // @mode: Advance only on explicit request
    Manual,
}

impl PlayMode {
    // @returns: The other mode
    pub fn toggled(self) -> Self {
        match self {
            Self::Auto => Self::Manual,
            Self::Manual => Self::Auto,
        }
    }

    // @returns: Capitalized mode name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Auto => "Auto",
            Self::Manual => "Manual",
        }
    }
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for PlayMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(anyhow!("Invalid play mode: {}", s)),
        }
    }
}

/// Playback policy configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaybackConfig {
    /// Mode the controller starts in
    #[serde(default)]
    pub default_mode: PlayMode,

    /// Whether the controller starts paused
    #[serde(default)]
    pub start_paused: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_mode: PlayMode::Auto,
            start_paused: false,
        }
    }
}

/// Audio mix configuration. Volumes are in 0.0..=1.0.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AudioConfig {
    /// Narration volume
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f32,

    /// Background music volume, kept below voice and se
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f32,

    /// Sound effect volume
    #[serde(default = "default_se_volume")]
    pub se_volume: f32,

    /// Whether background music loops
    #[serde(default = "default_true")]
    pub bgm_loop: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            voice_volume: default_voice_volume(),
            bgm_volume: default_bgm_volume(),
            se_volume: default_se_volume(),
            bgm_loop: true,
        }
    }
}

/// Asset resolution configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssetConfig {
    /// Directory that relative pass-through paths are joined onto
    #[serde(default)]
    pub asset_root: Option<PathBuf>,

    /// Server base URL that upload paths are joined onto
    #[serde(default)]
    pub remote_base_url: Option<String>,

    /// Path prefix used by server-side uploads
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            remote_base_url: None,
            upload_prefix: default_upload_prefix(),
        }
    }
}

/// Save slot configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SaveConfig {
    /// Number of save slots
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            max_slots: default_max_slots(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_voice_volume() -> f32 {
    1.0
}

fn default_bgm_volume() -> f32 {
    0.5
}

fn default_se_volume() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_upload_prefix() -> String {
    "/uploads/".to_string()
}

fn default_max_slots() -> usize {
    5
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        for (name, volume) in [
            ("voice_volume", self.audio.voice_volume),
            ("bgm_volume", self.audio.bgm_volume),
            ("se_volume", self.audio.se_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(anyhow!("{} must be within 0.0..=1.0, got {}", name, volume));
            }
        }

        if self.saves.max_slots == 0 {
            return Err(anyhow!("At least one save slot is required"));
        }

        if let Some(base) = &self.assets.remote_base_url {
            url::Url::parse(base)
                .with_context(|| format!("Invalid remote base URL: {}", base))?;
        }

        if self.assets.upload_prefix.is_empty() {
            return Err(anyhow!("Upload prefix must not be empty"));
        }

        Ok(())
    }
}
