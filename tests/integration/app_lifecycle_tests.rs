/*!
 * Integration tests for application lifecycle
 */

use std::path::Path;
use anyhow::Result;
use novelplay::app_config::{Config, PlayMode};
use novelplay::app_controller::{Controller, RunOptions};
use crate::common;

/// Write a silent mono WAV of the given length
fn write_silent_wav(path: &Path, duration_ms: u32) -> Result<()> {
    let format = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, format)?;
    for _ in 0..(8000 * duration_ms / 1000) {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}

fn fast_options() -> RunOptions {
    RunOptions {
        fast: true,
        max_frames: Some(10_000),
        ..RunOptions::default()
    }
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert_eq!(controller.config().saves.max_slots, 5);
    Ok(())
}

/// Test the controller rejects an invalid configuration
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.audio.voice_volume = 2.0;
    assert!(Controller::with_config(config).is_err());
}

/// Test a full headless run on a simulated clock
#[tokio::test]
async fn test_run_withFastClock_shouldReachEnd() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_scenario(temp_dir.path(), "story.json")?;

    let summary = controller.run(&scenario, &fast_options()).await?;

    assert!(summary.reached_end);
    assert_eq!(summary.scenes_played, 2);
    assert_eq!(summary.subtitles_shown, 2);
    assert!(summary.frames > 0);
    Ok(())
}

/// Test starting from a later scene
#[test]
fn test_run_withStartScene_shouldSkipEarlierScenes() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_scenario(temp_dir.path(), "story.json")?;

    let options = RunOptions {
        start_scene: Some(2),
        ..fast_options()
    };
    let summary = tokio_test::block_on(async { controller.run(&scenario, &options).await })?;

    assert!(summary.reached_end);
    assert_eq!(summary.scenes_played, 1);
    assert_eq!(summary.subtitles_shown, 1);
    Ok(())
}

/// Test the frame limit stops playback early
#[tokio::test]
async fn test_run_withFrameLimit_shouldStopBeforeEnd() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_scenario(temp_dir.path(), "story.json")?;

    let options = RunOptions {
        max_frames: Some(10),
        mode: Some(PlayMode::Auto),
        ..fast_options()
    };
    let summary = controller.run(&scenario, &options).await?;

    assert!(!summary.reached_end);
    assert_eq!(summary.frames, 10);
    Ok(())
}

/// Test that missing audio files do not stop playback
#[tokio::test]
async fn test_run_withMissingAudio_shouldStillFinish() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_file(
        temp_dir.path(),
        "silent.json",
        r#"{
  "title": "Silent",
  "scenes": [
    {
      "id": 1,
      "source": "bg.png",
      "duration": 300,
      "audio": { "voice": "missing-voice.mp3", "bgm": "missing-bgm.mp3" },
      "subtitles": [ { "speaker": "A", "text": "Nobody hears this.", "start": 0, "end": 200, "voice": "missing-line.mp3" } ]
    }
  ]
}"#,
    )?;

    let summary = controller.run(&scenario, &fast_options()).await?;

    assert!(summary.reached_end);
    assert_eq!(summary.subtitles_shown, 1);
    Ok(())
}

/// Test that a narration longer than its scene stretches the scene
#[tokio::test]
async fn test_run_withLongVoiceFile_shouldWaitForNarration() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let voice = temp_dir.path().join("narration.wav");
    write_silent_wav(&voice, 3000)?;

    let scenario = serde_json::json!({
        "title": "Narrated",
        "scenes": [
            { "id": 1, "source": "bg.png", "duration": 1000, "audio": { "voice": voice.display().to_string() } }
        ]
    });
    let scenario = common::create_test_file(temp_dir.path(), "narrated.json", &scenario.to_string())?;

    let options = fast_options();
    let summary = controller.run(&scenario, &options).await?;

    assert!(summary.reached_end);
    assert!(
        summary.frames * options.frame_interval_ms >= 3000,
        "scene ended after {} frames",
        summary.frames
    );
    Ok(())
}

/// Test that a configuration starting paused still plays through
#[tokio::test]
async fn test_run_withStartPausedConfig_shouldStillReachEnd() -> Result<()> {
    let mut config = Config::default();
    config.playback.start_paused = true;
    let controller = Controller::with_config(config)?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_scenario(temp_dir.path(), "story.json")?;

    let summary = controller.run(&scenario, &fast_options()).await?;

    assert!(summary.reached_end);
    assert_eq!(summary.scenes_played, 2);
    Ok(())
}

/// Test a run on an invalid scenario fails before playing
#[tokio::test]
async fn test_run_withEmptyScenario_shouldFail() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_file(temp_dir.path(), "empty.json", r#"{ "title": "Empty", "scenes": [] }"#)?;

    let result = controller.run(&scenario, &fast_options()).await;

    assert!(result.is_err());
    Ok(())
}

/// Test the scenario outline
#[test]
fn test_inspect_withTestScenario_shouldListScenes() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_scenario(temp_dir.path(), "story.json")?;

    let lines = controller.inspect(&scenario)?;

    assert_eq!(lines[0], "Title: Test Story");
    assert!(lines.iter().any(|l| l.contains("#1") && l.contains("next: 2")));
    assert!(lines.iter().any(|l| l.contains("#2") && l.contains("next: end")));
    assert!(!lines.iter().any(|l| l.contains("warning")));
    Ok(())
}

/// Test the outline flags sparse ids and dangling transitions
#[test]
fn test_inspect_withSparseIds_shouldWarn() -> Result<()> {
    let controller = Controller::new_for_test()?;
    let temp_dir = common::create_temp_dir()?;
    let scenario = common::create_test_file(
        temp_dir.path(),
        "sparse.json",
        r#"{ "title": "Sparse", "scenes": [
            { "id": 5, "source": "a.png", "duration": 100, "transitions": { "nextSceneId": 8 } },
            { "id": 7, "source": "b.png", "duration": 100 }
        ] }"#,
    )?;

    let lines = controller.inspect(&scenario)?;

    assert!(lines.iter().any(|l| l.contains("next scene 8 does not exist")));
    assert!(lines.iter().any(|l| l.contains("not dense")));
    Ok(())
}
