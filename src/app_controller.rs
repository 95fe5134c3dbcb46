use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app_config::{Config, PlayMode};
use crate::assets::DefaultAssetResolver;
use crate::backends::HeadlessAudioBackend;
use crate::playback::{ManualTimeSource, PlaybackController, PlaybackEvent, SystemTimeSource, TimeSource};
use crate::scenario::{ScenarioDocument, SceneId};

// @module: Headless scenario playback for the command line

/// Options for one headless run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Advance a simulated clock one frame per iteration instead of sleeping
    pub fast: bool,
    /// Override the configured play mode
    pub mode: Option<PlayMode>,
    /// Scene to start from instead of the first one
    pub start_scene: Option<SceneId>,
    /// Frame period of the render loop
    pub frame_interval_ms: u64,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fast: false,
            mode: None,
            start_scene: None,
            frame_interval_ms: 16,
            max_frames: None,
        }
    }
}

/// What a headless run went through
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSummary {
    /// Scene activations, revisits included
    pub scenes_played: usize,
    /// Subtitles shown
    pub subtitles_shown: usize,
    /// Frames processed
    pub frames: u64,
    /// Whether a terminal scene was reached
    pub reached_end: bool,
}

/// Main application controller for headless playback
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read and validate a scenario file
    pub fn load_scenario<P: AsRef<Path>>(&self, path: P) -> Result<ScenarioDocument> {
        let path = path.as_ref();
        ScenarioDocument::from_file(path)
            .with_context(|| format!("Failed to load scenario: {}", path.display()))
    }

    /// Human readable outline of a scenario
    pub fn inspect<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let document = self.load_scenario(path)?;
        let mut lines = Vec::new();

        lines.push(format!("Title: {}", document.title));
        if let Some(author) = &document.author {
            lines.push(format!("Author: {}", author));
        }
        lines.push(format!(
            "Scenes: {} (nominal {})",
            document.scene_count(),
            Self::format_duration(Duration::from_millis(document.total_duration_ms()))
        ));

        for scene in &document.scenes {
            let next = scene
                .transition
                .next_scene_id
                .map_or_else(|| "end".to_string(), |id| id.to_string());
            let voiced = scene.subtitles.iter().filter(|s| s.voice.is_some()).count();
            lines.push(format!(
                "  #{} {:?} {} | {} | {} subtitle(s), {} voiced | next: {}",
                scene.id,
                scene.media_type,
                scene.source,
                Self::format_duration(Duration::from_millis(scene.duration_ms)),
                scene.subtitles.len(),
                voiced,
                next
            ));

            if let Some(next_id) = scene.transition.next_scene_id {
                if document.find_scene(next_id).is_none() {
                    lines.push(format!("    warning: next scene {} does not exist", next_id));
                }
            }
        }

        if !document.has_dense_ids() {
            lines.push("warning: scene ids are not dense 1..N; previous-scene follows document order".to_string());
        }

        Ok(lines)
    }

    /// Play a scenario file without audio output
    pub async fn run<P: AsRef<Path>>(&self, scenario_path: P, options: &RunOptions) -> Result<PlaybackSummary> {
        let start_time = Instant::now();
        let document = self.load_scenario(scenario_path)?;
        let scene_count = document.scene_count() as u64;

        let backend = HeadlessAudioBackend::new();
        let manual_time = options.fast.then(ManualTimeSource::new);
        let time: Arc<dyn TimeSource> = match &manual_time {
            Some(manual) => Arc::new(manual.clone()),
            None => Arc::new(SystemTimeSource),
        };

        let mut player = PlaybackController::new(
            &self.config,
            Box::new(DefaultAssetResolver::new(&self.config.assets)),
            Box::new(backend.clone()),
            time,
        );
        if let Some(mode) = options.mode {
            if player.play_mode() != mode {
                player.toggle_play_mode();
            }
        }

        let mut events = player.subscribe();
        player.load_scenario(document)?;
        match options.start_scene {
            Some(id) => player.load_scene(id)?,
            None => player.start()?,
        }
        // nothing can unpause a headless run later
        if player.is_paused() {
            info!("Ignoring start_paused for headless playback");
            player.set_paused(false);
        }

        let progress_bar = ProgressBar::new(scene_count);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scenes ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let frame = Duration::from_millis(options.frame_interval_ms.max(1));
        let mut interval = tokio::time::interval(frame);
        let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
        let mut summary = PlaybackSummary::default();

        info!("Playing '{}' in {} mode", self.describe_title(&player), player.play_mode());

        loop {
            match &manual_time {
                Some(manual) => manual.advance(frame),
                None => {
                    interval.tick().await;
                }
            }

            for event in backend.drain_events() {
                player.handle_media_event(event);
            }
            player.tick()?;
            summary.frames += 1;

            let mut waiting_for_advance = false;
            while let Ok(event) = events.try_recv() {
                match event {
                    PlaybackEvent::SceneChanged { scene, background } => {
                        summary.scenes_played += 1;
                        let position = player.current_position().map_or(0, |p| p as u64 + 1);
                        progress_bar.set_position(position);
                        progress_bar.set_message(format!("scene {}", scene.id));
                        if background.is_none() {
                            warn!("Scene {} has no playable background", scene.id);
                        }
                    }
                    PlaybackEvent::SubtitleChanged { subtitle: Some(subtitle) } => {
                        summary.subtitles_shown += 1;
                        progress_bar.println(format!("  {}", subtitle));
                    }
                    PlaybackEvent::SceneEnded { scene_id } => {
                        debug!("Scene {} finished", scene_id);
                        if player.play_mode() == PlayMode::Manual {
                            waiting_for_advance = true;
                        }
                    }
                    PlaybackEvent::End => summary.reached_end = true,
                    _ => {}
                }
            }

            if summary.reached_end {
                break;
            }

            if options.max_frames.is_some_and(|max| summary.frames >= max) {
                warn!("Stopping after {} frames", summary.frames);
                break;
            }

            if waiting_for_advance {
                progress_bar.println("  [press Enter to continue]");
                if stdin_lines.next_line().await?.is_none() {
                    return Err(anyhow!("Input closed while waiting to advance"));
                }
                player.next_scene()?;
            }
        }

        progress_bar.finish_with_message("done");
        info!(
            "Playback finished in {}: {} scene(s), {} subtitle(s)",
            Self::format_duration(start_time.elapsed()),
            summary.scenes_played,
            summary.subtitles_shown
        );

        Ok(summary)
    }

    fn describe_title(&self, player: &PlaybackController) -> String {
        player
            .document()
            .map_or_else(|| "untitled".to_string(), |doc| doc.title.clone())
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
