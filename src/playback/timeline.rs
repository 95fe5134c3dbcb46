/*!
 * Per-scene timeline.
 *
 * A `SceneTimeline` owns every resource of one live scene activation: the
 * clock, the audio handles and the subtitle scheduler. It is driven by the
 * host render loop through `tick`, which re-arms its own frame request on
 * every call; `deactivate` drops the pending request and releases all
 * audio before returning.
 *
 * State machine: `Idle -> Loading -> Playing <-> Paused -> Ended`.
 */

use std::sync::Arc;
use log::{debug, info, warn};

use crate::assets::AssetResolver;
use crate::playback::audio::{
    AudioBackend, AudioLevels, AudioTarget, AudioTrackSet, ClipKey, LoadTicket, MediaEvent, TrackRole,
};
use crate::playback::clock::{PlaybackClock, TimeSource};
use crate::playback::subtitles::{SubtitleChange, SubtitleScheduler};
use crate::scenario::{Scene, Subtitle};

/// Lifecycle of a scene timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// Pending render-loop callback. Only the request a timeline is currently
/// holding will be serviced; anything else is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    pub generation: u64,
    pub sequence: u64,
}

/// What a serviced tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Clock reading for this tick
    pub elapsed_ms: u64,
    /// Subtitle transition caused by this tick
    pub subtitle: SubtitleChange,
    /// True exactly once per activation, on the tick that crossed the end
    pub scene_ended: bool,
}

/// Playback of one scene activation
pub struct SceneTimeline {
    scene: Scene,
    generation: u64,
    state: TimelineState,
    clock: PlaybackClock,
    audio: AudioTrackSet,
    subtitles: SubtitleScheduler,
    paused: bool,
    audio_started: bool,
    end_fired: bool,
    frame: Option<FrameRequest>,
    frame_sequence: u64,
}

impl SceneTimeline {
    /// Create an idle timeline for `scene`, tagged with `generation`
    pub fn new(scene: Scene, generation: u64, time: Arc<dyn TimeSource>, levels: AudioLevels) -> Self {
        Self {
            scene,
            generation,
            state: TimelineState::Idle,
            clock: PlaybackClock::new(time),
            audio: AudioTrackSet::new(levels),
            subtitles: SubtitleScheduler::new(),
            paused: false,
            audio_started: false,
            end_fired: false,
            frame: None,
            frame_sequence: 0,
        }
    }

    fn request_frame(&mut self) {
        self.frame_sequence += 1;
        self.frame = Some(FrameRequest {
            generation: self.generation,
            sequence: self.frame_sequence,
        });
    }

    /// Construct audio handles, reset clock and scheduler, and enter
    /// `Playing` (or `Paused` when `paused`). Media failures are logged and
    /// the affected track stays silent.
    pub fn activate(&mut self, resolver: &dyn AssetResolver, backend: &mut dyn AudioBackend, paused: bool) {
        self.state = TimelineState::Loading;
        self.clock.reset();
        self.subtitles.reset();
        self.end_fired = false;
        self.audio_started = false;

        let tracks: Vec<(TrackRole, String)> = TrackRole::ALL
            .iter()
            .filter_map(|role| {
                let path = match role {
                    TrackRole::Voice => self.scene.audio.voice.as_ref(),
                    TrackRole::Bgm => self.scene.audio.bgm.as_ref(),
                    TrackRole::Se => self.scene.audio.se.as_ref(),
                };
                path.filter(|p| !p.is_empty()).map(|p| (*role, p.clone()))
            })
            .collect();

        for (role, path) in tracks {
            let ticket = LoadTicket {
                generation: self.generation,
                target: AudioTarget::Track(role),
            };
            match resolver.resolve(&path) {
                Ok(source) => {
                    self.audio.load(role, &source, backend, ticket);
                }
                Err(e) => warn!("Scene {}: {} track unavailable: {}", self.scene.id, role, e),
            }
        }

        let clips: Vec<(ClipKey, String)> = self
            .scene
            .subtitles
            .iter()
            .enumerate()
            .filter_map(|(index, sub)| {
                sub.voice
                    .as_ref()
                    .filter(|p| !p.is_empty())
                    .map(|p| (ClipKey::for_subtitle(index, sub), p.clone()))
            })
            .collect();

        for (key, path) in clips {
            let ticket = LoadTicket {
                generation: self.generation,
                target: AudioTarget::Clip(key),
            };
            match resolver.resolve(&path) {
                Ok(source) => {
                    self.audio.load_clip(key, &source, backend, ticket);
                }
                Err(e) => warn!("Scene {}: subtitle clip {} unavailable: {}", self.scene.id, key, e),
            }
        }

        self.paused = paused;
        if paused {
            self.clock.start_paused();
            self.state = TimelineState::Paused;
        } else {
            self.clock.start();
            self.start_audio();
            self.state = TimelineState::Playing;
        }

        self.request_frame();
        debug!(
            "Scene {} activated (generation {}, {} audio handle(s), {})",
            self.scene.id,
            self.generation,
            self.audio.handle_count(),
            if paused { "paused" } else { "playing" }
        );
    }

    fn start_audio(&mut self) {
        for role in TrackRole::ALL {
            self.audio.play(role);
        }
        self.audio_started = true;
    }

    /// Render-loop callback. Re-arms itself, then advances the scene when
    /// playing. Returns `None` for cancelled, paused, ended or idle ticks.
    pub fn tick(&mut self) -> Option<TickReport> {
        self.frame.take()?;
        self.request_frame();

        if self.state != TimelineState::Playing {
            return None;
        }

        let elapsed_ms = self.clock.elapsed_ms();
        let subtitle = self
            .subtitles
            .update(&self.scene.subtitles, elapsed_ms, &mut self.audio, false);

        let mut scene_ended = false;
        let effective = self.effective_duration_ms();
        if elapsed_ms >= effective && !self.end_fired {
            self.end_fired = true;
            self.state = TimelineState::Ended;
            scene_ended = true;
            info!("Scene {} ended after {}ms (effective duration {}ms)", self.scene.id, elapsed_ms, effective);
        }

        Some(TickReport {
            elapsed_ms,
            subtitle,
            scene_ended,
        })
    }

    /// Pause or resume. Clock accumulator and active subtitle are kept.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;

        match self.state {
            TimelineState::Playing if paused => {
                self.clock.pause();
                self.audio.suspend_all();
                self.state = TimelineState::Paused;
            }
            TimelineState::Paused if !paused => {
                self.clock.resume();
                if self.audio_started {
                    self.audio.resume_all();
                } else {
                    self.start_audio();
                }
                self.state = TimelineState::Playing;
            }
            TimelineState::Ended => {
                if paused {
                    self.audio.suspend_all();
                } else {
                    self.audio.resume_all();
                }
            }
            _ => {}
        }
    }

    /// Cancel the pending frame and release every owned audio handle
    pub fn deactivate(&mut self) {
        self.frame = None;
        self.audio.release_all();
        self.subtitles.reset();
        self.clock.reset();
        self.state = TimelineState::Idle;
        debug!("Scene {} deactivated (generation {})", self.scene.id, self.generation);
    }

    /// Apply an asynchronous media completion. Completions from another
    /// generation, or arriving after deactivation, are dropped.
    pub fn handle_media_event(&mut self, event: MediaEvent) -> bool {
        let ticket = event.ticket();
        if ticket.generation != self.generation || self.state == TimelineState::Idle {
            debug!(
                "Discarding stale media event for generation {} (current {})",
                ticket.generation, self.generation
            );
            return false;
        }

        match event {
            MediaEvent::Loaded { ticket, duration_ms } => {
                if let Some(duration_ms) = duration_ms {
                    self.audio.set_measured_duration(ticket.target, duration_ms);
                    if ticket.target == AudioTarget::Track(TrackRole::Voice) && duration_ms > self.scene.duration_ms {
                        debug!(
                            "Scene {} extended to {}ms by narration",
                            self.scene.id, duration_ms
                        );
                    }
                }
            }
            MediaEvent::Ended { ticket } => self.audio.mark_ended(ticket.target),
            MediaEvent::Failed { ticket, error } => self.audio.mark_failed(ticket.target, &error),
        }
        true
    }

    /// `max(nominal duration, measured narration duration)`
    pub fn effective_duration_ms(&self) -> u64 {
        let voice = self.audio.measured_duration(TrackRole::Voice).unwrap_or(0);
        self.scene.duration_ms.max(voice)
    }

    pub fn set_volume(&mut self, role: TrackRole, volume: f32) {
        self.audio.set_volume(role, volume);
    }

    /// Currently active subtitle with its key
    pub fn active_subtitle(&self) -> Option<(ClipKey, &Subtitle)> {
        let key = self.subtitles.active_key()?;
        self.scene.subtitles.get(key.index).map(|sub| (key, sub))
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the end latch has fired for this activation
    pub fn has_ended(&self) -> bool {
        self.end_fired
    }

    /// Frame request waiting to be serviced, if any
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.frame
    }

    pub fn audio(&self) -> &AudioTrackSet {
        &self.audio
    }
}
