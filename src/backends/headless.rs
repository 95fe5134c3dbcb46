/*!
 * Headless audio backend.
 *
 * Produces silent handles so a scenario can be played without an audio
 * device. Local sources are checked for existence at load time so missing
 * assets show up in the log the same way a real backend would report them,
 * and their container headers are probed with symphonia so narration still
 * stretches a scene to its real length. Load completions are queued and
 * handed back to the host loop through `drain_events`.
 */

use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use log::{debug, trace};
use parking_lot::Mutex;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::assets::MediaSource;
use crate::errors::MediaError;
use crate::playback::audio::{AudioBackend, AudioHandle, LoadTicket, MediaEvent};

/// Silent backend for command-line playback
#[derive(Debug, Clone, Default)]
pub struct HeadlessAudioBackend {
    events: Arc<Mutex<VecDeque<MediaEvent>>>,
}

impl HeadlessAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued completion
    pub fn drain_events(&self) -> Vec<MediaEvent> {
        self.events.lock().drain(..).collect()
    }
}

impl AudioBackend for HeadlessAudioBackend {
    fn load(&mut self, source: &MediaSource, ticket: LoadTicket) -> Result<Box<dyn AudioHandle>, MediaError> {
        let duration_ms = match source {
            MediaSource::Path(path) => {
                if !path.is_file() {
                    return Err(MediaError::Load {
                        source_path: path.display().to_string(),
                        reason: "file not found".to_string(),
                    });
                }
                probe_duration_ms(path)
            }
            _ => None,
        };

        self.events.lock().push_back(MediaEvent::Loaded { ticket, duration_ms });

        Ok(Box::new(SilentHandle {
            source: source.describe(),
            playing: false,
        }))
    }
}

/// Duration from the container header, `None` when the format is unknown or
/// the header carries no frame count
pub fn probe_duration_ms(path: &Path) -> Option<u64> {
    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = match symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => probed,
        Err(e) => {
            debug!("Could not probe {}: {}", path.display(), e);
            return None;
        }
    };

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)?;
    let frames = track.codec_params.n_frames?;
    let sample_rate = u64::from(track.codec_params.sample_rate?);
    if sample_rate == 0 {
        return None;
    }

    let duration_ms = frames * 1000 / sample_rate;
    trace!("Probed {}: {}ms", path.display(), duration_ms);
    Some(duration_ms)
}

struct SilentHandle {
    source: String,
    playing: bool,
}

impl AudioHandle for SilentHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        if !self.playing {
            trace!("[silent] play {}", self.source);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            trace!("[silent] pause {}", self.source);
        }
        self.playing = false;
    }

    fn rewind(&mut self) {}

    fn set_volume(&mut self, volume: f32) {
        trace!("[silent] volume {:.2} for {}", volume, self.source);
    }

    fn set_looping(&mut self, _looping: bool) {}

    fn detach(&mut self) {
        self.playing = false;
        trace!("[silent] detach {}", self.source);
    }
}
