/*!
 * Top-level playback state machine.
 *
 * The controller owns the loaded scenario, the position cursor, the play
 * mode and pause flag, and at most one live `SceneTimeline`. Switching
 * scenes always deactivates (and so releases) the old timeline before the
 * new one is activated.
 *
 * Navigation uses a position cursor resolved through a `SceneIndex` built
 * once per document, so sparse or reordered scene ids still navigate in
 * document order.
 */

use std::sync::Arc;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app_config::{Config, PlayMode};
use crate::assets::{AssetResolver, DefaultAssetResolver};
use crate::errors::{LoadError, NavigationError};
use crate::playback::audio::{AudioBackend, AudioLevels, MediaEvent, TrackRole};
use crate::playback::clock::{SystemTimeSource, TimeSource};
use crate::playback::events::{EventBus, PlaybackEvent};
use crate::playback::subtitles::SubtitleChange;
use crate::playback::timeline::SceneTimeline;
use crate::save_manager::{SaveData, SaveSettings, SubtitleSize};
use crate::scenario::{ScenarioDocument, Scene, SceneId, SceneIndex};

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Loading,
    Ready,
}

/// Drives scene selection, advancement policy and event emission
pub struct PlaybackController {
    state: ControllerState,
    document: Option<Arc<ScenarioDocument>>,
    index: SceneIndex,
    cursor: Option<usize>,
    play_mode: PlayMode,
    paused: bool,
    subtitles_enabled: bool,
    subtitle_size: SubtitleSize,
    levels: AudioLevels,
    timeline: Option<SceneTimeline>,
    generation: u64,
    resolver: Box<dyn AssetResolver>,
    backend: Box<dyn AudioBackend>,
    time: Arc<dyn TimeSource>,
    events: EventBus,
}

impl PlaybackController {
    /// Create a controller with explicit collaborators
    pub fn new(
        config: &Config,
        resolver: Box<dyn AssetResolver>,
        backend: Box<dyn AudioBackend>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            state: ControllerState::Uninitialized,
            document: None,
            index: SceneIndex::default(),
            cursor: None,
            play_mode: config.playback.default_mode,
            paused: config.playback.start_paused,
            subtitles_enabled: true,
            subtitle_size: SubtitleSize::default(),
            levels: AudioLevels::from(&config.audio),
            timeline: None,
            generation: 0,
            resolver,
            backend,
            time,
            events: EventBus::new(),
        }
    }

    /// Create a controller with the default resolver and the system clock
    pub fn with_backend(config: &Config, backend: Box<dyn AudioBackend>) -> Self {
        Self::new(
            config,
            Box::new(DefaultAssetResolver::new(&config.assets)),
            backend,
            Arc::new(SystemTimeSource),
        )
    }

    /// Register an event subscriber
    pub fn subscribe(&mut self) -> UnboundedReceiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Install a scenario. On failure nothing changes and the error is returned.
    pub fn load_scenario(&mut self, document: ScenarioDocument) -> Result<(), LoadError> {
        let previous = self.state;
        self.state = ControllerState::Loading;

        if let Err(e) = document.validate() {
            error!("Failed to load scenario: {}", e);
            self.state = previous;
            return Err(e);
        }

        if !document.has_dense_ids() {
            warn!(
                "Scenario '{}' does not use dense 1..N scene ids; navigation follows document order",
                document.title
            );
        }

        self.deactivate_current();
        self.index = SceneIndex::build(&document);
        self.cursor = Some(0);
        info!("Scenario loaded: {} ({} scenes)", document.title, document.scene_count());
        self.document = Some(Arc::new(document));
        self.state = ControllerState::Ready;
        Ok(())
    }

    /// Load the first scene of the document
    pub fn start(&mut self) -> Result<(), NavigationError> {
        let first = self
            .document
            .as_ref()
            .and_then(|doc| doc.scenes.first())
            .map(|scene| scene.id)
            .ok_or(NavigationError::NotLoaded)?;
        self.load_scene(first)
    }

    fn deactivate_current(&mut self) {
        if let Some(mut timeline) = self.timeline.take() {
            timeline.deactivate();
            self.generation += 1;
        }
    }

    /// Make `id` the current scene. Unknown ids leave the current scene untouched.
    pub fn load_scene(&mut self, id: SceneId) -> Result<(), NavigationError> {
        let document = self.document.clone().ok_or(NavigationError::NotLoaded)?;
        let (position, scene) = self
            .index
            .position(id)
            .and_then(|pos| document.scenes.get(pos).map(|scene| (pos, scene.clone())))
            .ok_or_else(|| {
                error!("Scene {} not found", id);
                NavigationError::SceneNotFound(id)
            })?;

        self.deactivate_current();
        self.generation += 1;

        let mut timeline = SceneTimeline::new(scene.clone(), self.generation, self.time.clone(), self.levels);
        timeline.activate(self.resolver.as_ref(), self.backend.as_mut(), self.paused);

        let background = match self.resolver.resolve(&scene.source) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("Scene {}: background unavailable: {}", scene.id, e);
                None
            }
        };

        self.timeline = Some(timeline);
        self.cursor = Some(position);
        debug!("Scene {} is current (position {})", id, position);
        self.events.emit(PlaybackEvent::SceneChanged { scene, background });
        Ok(())
    }

    /// Follow the current scene's transition. A terminal scene emits `End`
    /// and leaves the position unchanged.
    pub fn next_scene(&mut self) -> Result<Option<SceneId>, NavigationError> {
        let next = self
            .current_scene()
            .ok_or(NavigationError::NotLoaded)?
            .transition
            .next_scene_id;

        match next {
            Some(id) => {
                self.load_scene(id)?;
                Ok(Some(id))
            }
            None => {
                info!("End of story");
                self.events.emit(PlaybackEvent::End);
                Ok(None)
            }
        }
    }

    /// Step back one position in document order. No-op on the first scene.
    pub fn previous_scene(&mut self) -> Result<Option<SceneId>, NavigationError> {
        let document = self.document.clone().ok_or(NavigationError::NotLoaded)?;
        let previous = match self.cursor {
            Some(pos) if pos > 0 => document.scenes.get(pos - 1).map(|scene| scene.id),
            _ => None,
        };

        match previous {
            Some(id) => {
                self.load_scene(id)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Render-loop frame callback. Drives the active timeline and applies
    /// the auto-advance policy. Only navigation errors are returned.
    pub fn tick(&mut self) -> Result<(), NavigationError> {
        let Some(timeline) = self.timeline.as_mut() else {
            return Ok(());
        };
        let Some(report) = timeline.tick() else {
            return Ok(());
        };

        let scene_id = timeline.scene().id;
        let subtitle = match report.subtitle {
            SubtitleChange::Unchanged => None,
            SubtitleChange::Activated(key) => Some(timeline.scene().subtitles.get(key.index).cloned()),
            SubtitleChange::Cleared => Some(None),
        };

        self.events.emit(PlaybackEvent::TimeUpdate {
            elapsed_ms: report.elapsed_ms,
        });

        if let Some(subtitle) = subtitle {
            if self.subtitles_enabled {
                self.events.emit(PlaybackEvent::SubtitleChanged { subtitle });
            }
        }

        if report.scene_ended {
            self.events.emit(PlaybackEvent::SceneEnded { scene_id });
            if self.play_mode == PlayMode::Auto && !self.paused {
                self.next_scene()?;
            } else {
                debug!("Scene {} ended; waiting for explicit advance", scene_id);
            }
        }

        Ok(())
    }

    /// Forward an asynchronous media completion to the live timeline
    pub fn handle_media_event(&mut self, event: MediaEvent) -> bool {
        match self.timeline.as_mut() {
            Some(timeline) => timeline.handle_media_event(event),
            None => {
                debug!("Discarding media event with no active scene");
                false
            }
        }
    }

    pub fn toggle_play_mode(&mut self) -> PlayMode {
        self.play_mode = self.play_mode.toggled();
        info!("Play mode changed to: {}", self.play_mode);
        self.events.emit(PlaybackEvent::PlayModeChanged(self.play_mode));
        self.play_mode
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// Set the pause flag and propagate it to the active timeline
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.set_paused(paused);
        }
        self.events.emit(PlaybackEvent::PauseChanged(paused));
    }

    /// Change a role's volume for the live scene and later ones
    pub fn set_volume(&mut self, role: TrackRole, volume: f32) {
        self.levels.set_volume(role, volume);
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.set_volume(role, volume);
        }
    }

    pub fn set_subtitles_enabled(&mut self, enabled: bool) {
        self.subtitles_enabled = enabled;
    }

    /// Display preference carried through saves; the host renders it
    pub fn set_subtitle_size(&mut self, size: SubtitleSize) {
        self.subtitle_size = size;
    }

    /// Save data for the current scene, or `None` when nothing is playing
    pub fn snapshot(&self, thumbnail: &str) -> Option<SaveData> {
        let scene = self.current_scene()?;
        Some(SaveData::new(
            scene.id,
            thumbnail,
            SaveSettings {
                bgm_volume: self.levels.bgm,
                voice_volume: self.levels.voice,
                se_volume: self.levels.se,
                subtitles_enabled: self.subtitles_enabled,
                subtitle_size: self.subtitle_size,
            },
        ))
    }

    /// Jump to the saved scene, then apply the saved settings. If the scene
    /// cannot be loaded nothing changes.
    pub fn restore(&mut self, save: &SaveData) -> Result<(), NavigationError> {
        self.load_scene(save.scene_id)?;

        let settings = &save.settings;
        self.set_volume(TrackRole::Bgm, settings.bgm_volume);
        self.set_volume(TrackRole::Voice, settings.voice_volume);
        self.set_volume(TrackRole::Se, settings.se_volume);
        self.subtitles_enabled = settings.subtitles_enabled;
        self.subtitle_size = settings.subtitle_size;
        Ok(())
    }

    /// Position of the current scene as a percentage of the document
    pub fn get_progress(&self) -> f64 {
        match (&self.document, self.cursor) {
            (Some(doc), Some(pos)) if doc.scene_count() > 0 => {
                (pos + 1) as f64 / doc.scene_count() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn subtitles_enabled(&self) -> bool {
        self.subtitles_enabled
    }

    pub fn subtitle_size(&self) -> SubtitleSize {
        self.subtitle_size
    }

    /// Current volume levels
    pub fn levels(&self) -> AudioLevels {
        self.levels
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn document(&self) -> Option<&ScenarioDocument> {
        self.document.as_deref()
    }

    /// Scene under the cursor
    pub fn current_scene(&self) -> Option<&Scene> {
        let doc = self.document.as_ref()?;
        doc.scenes.get(self.cursor?)
    }

    pub fn current_scene_id(&self) -> Option<SceneId> {
        self.current_scene().map(|scene| scene.id)
    }

    /// Cursor position in document order
    pub fn current_position(&self) -> Option<usize> {
        self.cursor
    }

    pub fn timeline(&self) -> Option<&SceneTimeline> {
        self.timeline.as_ref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timeline.as_ref().map_or(0, |t| t.elapsed_ms())
    }

    pub fn effective_duration_ms(&self) -> Option<u64> {
        self.timeline.as_ref().map(|t| t.effective_duration_ms())
    }

    /// Generation of the live timeline
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.deactivate_current();
    }
}
