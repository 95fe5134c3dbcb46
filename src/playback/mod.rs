/*!
 * Scene playback engine.
 *
 * This module contains the state machines that turn a scenario document
 * into timed playback. It is split into several submodules:
 *
 * - `clock`: Pause-aware elapsed time and the time source seam
 * - `audio`: Continuous tracks and subtitle clips of one scene
 * - `subtitles`: Elapsed time to active subtitle mapping
 * - `timeline`: Per-scene controller composing the three above
 * - `controller`: Scenario-level navigation and advancement policy
 * - `events`: Events published to the host UI
 */

// Re-export main types for easier usage
pub use self::audio::{
    AudioBackend, AudioHandle, AudioLevels, AudioTarget, AudioTrackSet, ClipKey, LoadTicket, MediaEvent,
    SlotState, TrackRole,
};
pub use self::clock::{ManualTimeSource, PlaybackClock, SystemTimeSource, TimeSource};
pub use self::controller::{ControllerState, PlaybackController};
pub use self::events::{EventBus, PlaybackEvent};
pub use self::subtitles::{SubtitleChange, SubtitleScheduler};
pub use self::timeline::{FrameRequest, SceneTimeline, TickReport, TimelineState};

// Submodules
pub mod audio;
pub mod clock;
pub mod controller;
pub mod events;
pub mod subtitles;
pub mod timeline;
