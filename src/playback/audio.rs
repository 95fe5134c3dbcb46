/*!
 * Audio track management for one live scene.
 *
 * An `AudioTrackSet` owns up to three continuous tracks (voice, bgm, se)
 * and one clip per voiced subtitle. Handles come from an `AudioBackend`
 * and are exclusively owned here; `release_all` detaches and drops every
 * one of them, after which nothing else can reach them.
 *
 * Playback failures are absorbed: a rejected `play()` is logged and the
 * slot is marked failed, leaving that track silent while the scene keeps
 * running on wall-clock time.
 */

use std::collections::HashMap;
use std::fmt;
use log::{debug, trace, warn};

use crate::app_config::AudioConfig;
use crate::assets::MediaSource;
use crate::errors::MediaError;
use crate::scenario::Subtitle;

/// Continuous track roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackRole {
    Voice,
    Bgm,
    Se,
}

impl TrackRole {
    /// Every role in activation order
    pub const ALL: [TrackRole; 3] = [TrackRole::Voice, TrackRole::Bgm, TrackRole::Se];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Bgm => "bgm",
            Self::Se => "se",
        }
    }
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stable key of a subtitle clip: declaration index plus timing.
/// Text edits keep the key, timing edits orphan the bound clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipKey {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ClipKey {
    pub fn new(index: usize, start_ms: u64, end_ms: u64) -> Self {
        Self { index, start_ms, end_ms }
    }

    /// Key for the subtitle declared at `index`
    pub fn for_subtitle(index: usize, subtitle: &Subtitle) -> Self {
        Self::new(index, subtitle.start_ms, subtitle.end_ms)
    }
}

impl fmt::Display for ClipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.index, self.start_ms, self.end_ms)
    }
}

/// What a handle plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTarget {
    Track(TrackRole),
    Clip(ClipKey),
}

/// Tag handed to the backend with every load. The generation identifies the
/// scene activation that issued the load, so late completions can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
    pub target: AudioTarget,
}

/// Asynchronous completion reported by the host's media layer
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata is available; `duration_ms` is the measured length if known
    Loaded {
        ticket: LoadTicket,
        duration_ms: Option<u64>,
    },
    /// Playback reached the end of a non-looping source
    Ended { ticket: LoadTicket },
    /// Loading or playback failed after the handle was created
    Failed { ticket: LoadTicket, error: MediaError },
}

impl MediaEvent {
    pub fn ticket(&self) -> LoadTicket {
        match self {
            Self::Loaded { ticket, .. } | Self::Ended { ticket } | Self::Failed { ticket, .. } => *ticket,
        }
    }
}

/// A single playable audio element
pub trait AudioHandle {
    /// Start or continue playback. `Err` covers autoplay rejection and decode failure.
    fn play(&mut self) -> Result<(), MediaError>;

    /// Pause at the current position
    fn pause(&mut self);

    /// Seek back to the start
    fn rewind(&mut self);

    fn set_volume(&mut self, volume: f32);

    fn set_looping(&mut self, looping: bool);

    /// Release the underlying element. The handle is never used again.
    fn detach(&mut self);
}

/// Creates audio handles. Creating a handle never starts playback.
pub trait AudioBackend {
    fn load(&mut self, source: &MediaSource, ticket: LoadTicket) -> Result<Box<dyn AudioHandle>, MediaError>;
}

/// Per-role volume and looping defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioLevels {
    pub voice: f32,
    pub bgm: f32,
    pub se: f32,
    pub bgm_loop: bool,
}

impl AudioLevels {
    pub fn volume(&self, role: TrackRole) -> f32 {
        match role {
            TrackRole::Voice => self.voice,
            TrackRole::Bgm => self.bgm,
            TrackRole::Se => self.se,
        }
    }

    pub fn set_volume(&mut self, role: TrackRole, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        match role {
            TrackRole::Voice => self.voice = volume,
            TrackRole::Bgm => self.bgm = volume,
            TrackRole::Se => self.se = volume,
        }
    }
}

impl Default for AudioLevels {
    fn default() -> Self {
        Self::from(&AudioConfig::default())
    }
}

impl From<&AudioConfig> for AudioLevels {
    fn from(config: &AudioConfig) -> Self {
        Self {
            voice: config.voice_volume,
            bgm: config.bgm_volume,
            se: config.se_volume,
            bgm_loop: config.bgm_loop,
        }
    }
}

/// Lifecycle of one owned handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Constructed, never played
    Loaded,
    Playing,
    /// Paused by an explicit `pause(role)`
    Paused,
    /// Paused because the whole scene paused; resumed with it
    Suspended,
    /// Paused and rewound
    Stopped,
    /// Reached its end
    Ended,
    /// Playback rejected; left silent
    Failed,
}

struct TrackSlot {
    handle: Box<dyn AudioHandle>,
    source: String,
    state: SlotState,
    duration_ms: Option<u64>,
}

impl TrackSlot {
    fn new(handle: Box<dyn AudioHandle>, source: String) -> Self {
        Self {
            handle,
            source,
            state: SlotState::Loaded,
            duration_ms: None,
        }
    }

    fn play(&mut self) {
        // failed slots stay silent for the rest of the activation
        if matches!(self.state, SlotState::Playing | SlotState::Failed) {
            return;
        }
        match self.handle.play() {
            Ok(()) => self.state = SlotState::Playing,
            Err(e) => {
                warn!("Audio play failed, continuing silently: {}", e);
                self.state = SlotState::Failed;
            }
        }
    }

    fn pause(&mut self, next: SlotState) {
        if self.state == SlotState::Playing {
            self.handle.pause();
            self.state = next;
        }
    }

    fn stop(&mut self) {
        self.handle.pause();
        self.handle.rewind();
        if self.state != SlotState::Failed {
            self.state = SlotState::Stopped;
        }
    }

    fn release(mut self) {
        self.handle.pause();
        self.handle.rewind();
        self.handle.detach();
        trace!("Released audio handle for {}", self.source);
    }
}

/// Audio handles owned by one scene activation
pub struct AudioTrackSet {
    tracks: HashMap<TrackRole, TrackSlot>,
    clips: HashMap<ClipKey, TrackSlot>,
    levels: AudioLevels,
}

impl AudioTrackSet {
    pub fn new(levels: AudioLevels) -> Self {
        Self {
            tracks: HashMap::new(),
            clips: HashMap::new(),
            levels,
        }
    }

    fn prepare(&self, handle: &mut dyn AudioHandle, role: TrackRole) {
        handle.set_looping(role == TrackRole::Bgm && self.levels.bgm_loop);
        handle.set_volume(self.levels.volume(role));
    }

    /// Construct the handle for a continuous track without playing it.
    /// Returns false when the backend refused the source.
    pub fn load(
        &mut self,
        role: TrackRole,
        source: &MediaSource,
        backend: &mut dyn AudioBackend,
        ticket: LoadTicket,
    ) -> bool {
        if let Some(previous) = self.tracks.remove(&role) {
            previous.release();
        }

        match backend.load(source, ticket) {
            Ok(mut handle) => {
                self.prepare(handle.as_mut(), role);
                debug!("Loaded {} track from {}", role, source);
                self.tracks.insert(role, TrackSlot::new(handle, source.describe()));
                true
            }
            Err(e) => {
                warn!("Failed to load {} track, continuing without it: {}", role, e);
                false
            }
        }
    }

    /// Construct the handle for a subtitle clip without playing it
    pub fn load_clip(
        &mut self,
        key: ClipKey,
        source: &MediaSource,
        backend: &mut dyn AudioBackend,
        ticket: LoadTicket,
    ) -> bool {
        if let Some(previous) = self.clips.remove(&key) {
            previous.release();
        }

        match backend.load(source, ticket) {
            Ok(mut handle) => {
                self.prepare(handle.as_mut(), TrackRole::Voice);
                debug!("Loaded subtitle clip {} from {}", key, source);
                self.clips.insert(key, TrackSlot::new(handle, source.describe()));
                true
            }
            Err(e) => {
                warn!("Failed to load subtitle clip {}, continuing without it: {}", key, e);
                false
            }
        }
    }

    /// Start a track. Idempotent while it is already playing.
    pub fn play(&mut self, role: TrackRole) {
        if let Some(slot) = self.tracks.get_mut(&role) {
            slot.play();
        }
    }

    pub fn pause(&mut self, role: TrackRole) {
        if let Some(slot) = self.tracks.get_mut(&role) {
            slot.pause(SlotState::Paused);
        }
    }

    /// Pause and rewind to zero
    pub fn stop(&mut self, role: TrackRole) {
        if let Some(slot) = self.tracks.get_mut(&role) {
            slot.stop();
        }
    }

    /// Set a role's volume for this and later loads
    pub fn set_volume(&mut self, role: TrackRole, volume: f32) {
        self.levels.set_volume(role, volume);
        let volume = self.levels.volume(role);
        if let Some(slot) = self.tracks.get_mut(&role) {
            slot.handle.set_volume(volume);
        }
        if role == TrackRole::Voice {
            for slot in self.clips.values_mut() {
                slot.handle.set_volume(volume);
            }
        }
    }

    /// Start a clip from zero
    pub fn play_clip(&mut self, key: ClipKey) {
        if let Some(slot) = self.clips.get_mut(&key) {
            slot.stop();
            slot.play();
        }
    }

    /// Pause and rewind a clip
    pub fn stop_clip(&mut self, key: ClipKey) {
        if let Some(slot) = self.clips.get_mut(&key) {
            slot.stop();
        }
    }

    /// Pause everything that is playing, remembering it for `resume_all`
    pub fn suspend_all(&mut self) {
        for slot in self.tracks.values_mut().chain(self.clips.values_mut()) {
            slot.pause(SlotState::Suspended);
        }
    }

    /// Resume everything `suspend_all` paused, from where it stopped
    pub fn resume_all(&mut self) {
        for slot in self.tracks.values_mut().chain(self.clips.values_mut()) {
            if slot.state == SlotState::Suspended {
                slot.play();
            }
        }
    }

    /// Stop and detach every handle. Must run before another scene activates.
    pub fn release_all(&mut self) {
        let count = self.tracks.len() + self.clips.len();
        for (_, slot) in self.tracks.drain() {
            slot.release();
        }
        for (_, slot) in self.clips.drain() {
            slot.release();
        }
        if count > 0 {
            debug!("Released {} audio handle(s)", count);
        }
    }

    fn slot_mut(&mut self, target: AudioTarget) -> Option<&mut TrackSlot> {
        match target {
            AudioTarget::Track(role) => self.tracks.get_mut(&role),
            AudioTarget::Clip(key) => self.clips.get_mut(&key),
        }
    }

    fn slot(&self, target: AudioTarget) -> Option<&TrackSlot> {
        match target {
            AudioTarget::Track(role) => self.tracks.get(&role),
            AudioTarget::Clip(key) => self.clips.get(&key),
        }
    }

    /// Record a measured source length
    pub fn set_measured_duration(&mut self, target: AudioTarget, duration_ms: u64) {
        if let Some(slot) = self.slot_mut(target) {
            slot.duration_ms = Some(duration_ms);
        }
    }

    /// Measured length of a continuous track, if reported
    pub fn measured_duration(&self, role: TrackRole) -> Option<u64> {
        self.tracks.get(&role).and_then(|slot| slot.duration_ms)
    }

    /// A source finished on its own
    pub fn mark_ended(&mut self, target: AudioTarget) {
        if let Some(slot) = self.slot_mut(target) {
            if slot.state == SlotState::Playing {
                slot.state = SlotState::Ended;
            }
        }
    }

    /// A source failed after creation; it stays silent
    pub fn mark_failed(&mut self, target: AudioTarget, error: &MediaError) {
        if let Some(slot) = self.slot_mut(target) {
            warn!("Audio source {} failed, continuing silently: {}", slot.source, error);
            slot.handle.pause();
            slot.state = SlotState::Failed;
        }
    }

    pub fn state(&self, target: AudioTarget) -> Option<SlotState> {
        self.slot(target).map(|slot| slot.state)
    }

    pub fn is_playing(&self, target: AudioTarget) -> bool {
        self.state(target) == Some(SlotState::Playing)
    }

    pub fn has_track(&self, role: TrackRole) -> bool {
        self.tracks.contains_key(&role)
    }

    pub fn has_clip(&self, key: ClipKey) -> bool {
        self.clips.contains_key(&key)
    }

    /// Number of live handles
    pub fn handle_count(&self) -> usize {
        self.tracks.len() + self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handle_count() == 0
    }

    pub fn levels(&self) -> AudioLevels {
        self.levels
    }
}

impl Drop for AudioTrackSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
