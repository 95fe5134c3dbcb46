use log::trace;

use crate::playback::audio::{AudioTrackSet, ClipKey};
use crate::scenario::Subtitle;

// @module: Active subtitle tracking

/// Result of one scheduler update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleChange {
    /// Same subtitle (or none) as last tick
    Unchanged,
    /// A different subtitle became active
    Activated(ClipKey),
    /// The previously active subtitle ended and nothing replaced it
    Cleared,
}

// @struct: Maps elapsed time to the active subtitle
#[derive(Debug, Default)]
pub struct SubtitleScheduler {
    active: Option<ClipKey>,
}

impl SubtitleScheduler {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// First subtitle in declaration order whose closed interval contains `elapsed_ms`
    pub fn find_active(subtitles: &[Subtitle], elapsed_ms: u64) -> Option<ClipKey> {
        subtitles
            .iter()
            .enumerate()
            .find(|(_, sub)| sub.contains(elapsed_ms))
            .map(|(index, sub)| ClipKey::for_subtitle(index, sub))
    }

    /// Advance to `elapsed_ms`. Only a change of active key rewinds and
    /// starts a clip; staying inside the same interval touches nothing.
    pub fn update(
        &mut self,
        subtitles: &[Subtitle],
        elapsed_ms: u64,
        audio: &mut AudioTrackSet,
        paused: bool,
    ) -> SubtitleChange {
        let next = Self::find_active(subtitles, elapsed_ms);
        if next == self.active {
            return SubtitleChange::Unchanged;
        }

        if let Some(previous) = self.active.take() {
            audio.stop_clip(previous);
        }

        match next {
            Some(key) => {
                trace!("Subtitle {} active at {}ms", key, elapsed_ms);
                if !paused {
                    audio.play_clip(key);
                }
                self.active = Some(key);
                SubtitleChange::Activated(key)
            }
            None => {
                trace!("Subtitle cleared at {}ms", elapsed_ms);
                SubtitleChange::Cleared
            }
        }
    }

    pub fn active_key(&self) -> Option<ClipKey> {
        self.active
    }

    /// Forget the active key without touching audio
    pub fn reset(&mut self) {
        self.active = None;
    }
}
