/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use novelplay::app_config::{Config, LogLevel, PlayMode};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.playback.default_mode, PlayMode::Auto);
    assert!(!config.playback.start_paused);
    assert!((config.audio.voice_volume - 1.0).abs() < f32::EPSILON);
    assert!((config.audio.bgm_volume - 0.5).abs() < f32::EPSILON);
    assert!((config.audio.se_volume - 1.0).abs() < f32::EPSILON);
    assert!(config.audio.bgm_loop);
    assert_eq!(config.assets.upload_prefix, "/uploads/");
    assert_eq!(config.saves.max_slots, 5);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.audio.bgm_volume = 1.5;
    assert!(config.validate().is_err());
    config.audio.bgm_volume = 0.5;

    config.saves.max_slots = 0;
    assert!(config.validate().is_err());
    config.saves.max_slots = 3;

    config.assets.remote_base_url = Some("not a url".to_string());
    assert!(config.validate().is_err());
    config.assets.remote_base_url = Some("https://example.com".to_string());
    assert!(config.validate().is_ok());

    config.assets.upload_prefix = String::new();
    assert!(config.validate().is_err());
}

/// Test partial config files fall back to defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(r#"{ "playback": { "default_mode": "manual" }, "log_level": "debug" }"#)?;

    assert_eq!(config.playback.default_mode, PlayMode::Manual);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.saves.max_slots, 5);
    Ok(())
}

/// Test saving and loading configuration through a file
#[test]
fn test_save_and_load_withTempFile_shouldRoundTripSettings() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.playback.default_mode = PlayMode::Manual;
    config.audio.se_volume = 0.25;
    config.save_to_file(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.playback.default_mode, PlayMode::Manual);
    assert!((loaded.audio.se_volume - 0.25).abs() < f32::EPSILON);
    Ok(())
}

#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "bad.json", "{ nope")?;
    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_play_mode_parsing_and_toggle_shouldMatchNames() {
    assert_eq!("AUTO".parse::<PlayMode>().ok(), Some(PlayMode::Auto));
    assert_eq!("manual".parse::<PlayMode>().ok(), Some(PlayMode::Manual));
    assert!("sometimes".parse::<PlayMode>().is_err());
    assert_eq!(PlayMode::Auto.toggled(), PlayMode::Manual);
    assert_eq!(PlayMode::Manual.display_name(), "Manual");
    assert_eq!(PlayMode::Manual.to_string(), "manual");
}

#[test]
fn test_log_level_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
