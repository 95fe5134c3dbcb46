/*!
 * Mock audio backend for testing.
 *
 * This module provides a backend that simulates different behaviors:
 * - `MockAudioBackend::working()` - Every load and play succeeds
 * - `MockAudioBackend::rejecting_play()` - Loads succeed, `play()` is rejected (autoplay block)
 * - `MockAudioBackend::failing_load()` - Every load fails
 *
 * Clones share one call log so a test can keep a copy while the
 * controller owns the other.
 */

use std::sync::Arc;
use parking_lot::Mutex;

use crate::assets::MediaSource;
use crate::errors::MediaError;
use crate::playback::audio::{AudioBackend, AudioHandle, LoadTicket};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Loads and plays succeed
    Working,
    /// Loads succeed, every `play()` is rejected
    RejectPlay,
    /// Every load fails
    FailLoad,
}

/// One recorded handle operation
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Load { handle: usize, source: String },
    Play { handle: usize },
    Pause { handle: usize },
    Rewind { handle: usize },
    Volume { handle: usize, volume: f32 },
    Looping { handle: usize, looping: bool },
    Detach { handle: usize },
}

impl MockCall {
    /// Handle the call was made on
    pub fn handle(&self) -> usize {
        match self {
            Self::Load { handle, .. }
            | Self::Play { handle }
            | Self::Pause { handle }
            | Self::Rewind { handle }
            | Self::Volume { handle, .. }
            | Self::Looping { handle, .. }
            | Self::Detach { handle } => *handle,
        }
    }
}

/// Snapshot of one constructed handle
#[derive(Debug, Clone, PartialEq)]
pub struct MockHandleInfo {
    pub id: usize,
    pub source: String,
    pub ticket: LoadTicket,
    pub playing: bool,
    pub volume: f32,
    pub looping: bool,
    pub detached: bool,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    handles: Vec<MockHandleInfo>,
    failing_sources: Vec<String>,
}

/// Mock backend recording every call
#[derive(Debug, Clone)]
pub struct MockAudioBackend {
    behavior: MockBehavior,
    state: Arc<Mutex<MockState>>,
}

impl MockAudioBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a working mock backend
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a backend whose handles reject `play()`
    pub fn rejecting_play() -> Self {
        Self::new(MockBehavior::RejectPlay)
    }

    /// Create a backend that fails every load
    pub fn failing_load() -> Self {
        Self::new(MockBehavior::FailLoad)
    }

    /// Fail loads whose source contains `pattern`
    pub fn fail_sources_containing(self, pattern: &str) -> Self {
        self.state.lock().failing_sources.push(pattern.to_string());
        self
    }

    /// Every recorded call, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Calls made on one handle
    pub fn calls_for(&self, handle: usize) -> Vec<MockCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.handle() == handle)
            .cloned()
            .collect()
    }

    /// Every handle constructed so far
    pub fn handles(&self) -> Vec<MockHandleInfo> {
        self.state.lock().handles.clone()
    }

    /// Most recent handle whose source contains `pattern`
    pub fn handle_for(&self, pattern: &str) -> Option<MockHandleInfo> {
        self.state
            .lock()
            .handles
            .iter()
            .rev()
            .find(|h| h.source.contains(pattern))
            .cloned()
    }

    /// Ticket of the most recent handle whose source contains `pattern`
    pub fn ticket_for(&self, pattern: &str) -> Option<LoadTicket> {
        self.handle_for(pattern).map(|h| h.ticket)
    }

    /// Handles not yet detached
    pub fn live_handle_count(&self) -> usize {
        self.state.lock().handles.iter().filter(|h| !h.detached).count()
    }

    /// Number of `play()` calls made on a handle
    pub fn play_count(&self, handle: usize) -> usize {
        self.calls_for(handle)
            .iter()
            .filter(|call| matches!(call, MockCall::Play { .. }))
            .count()
    }
}

impl Default for MockAudioBackend {
    fn default() -> Self {
        Self::working()
    }
}

impl AudioBackend for MockAudioBackend {
    fn load(&mut self, source: &MediaSource, ticket: LoadTicket) -> Result<Box<dyn AudioHandle>, MediaError> {
        let description = source.describe();
        let mut state = self.state.lock();

        let fails = self.behavior == MockBehavior::FailLoad
            || state.failing_sources.iter().any(|p| description.contains(p.as_str()));
        if fails {
            return Err(MediaError::Load {
                source_path: description,
                reason: "mock load failure".to_string(),
            });
        }

        let id = state.handles.len();
        state.calls.push(MockCall::Load {
            handle: id,
            source: description.clone(),
        });
        state.handles.push(MockHandleInfo {
            id,
            source: description,
            ticket,
            playing: false,
            volume: 1.0,
            looping: false,
            detached: false,
        });

        Ok(Box::new(MockHandle {
            id,
            behavior: self.behavior,
            state: self.state.clone(),
        }))
    }
}

struct MockHandle {
    id: usize,
    behavior: MockBehavior,
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn record(&self, call: MockCall, update: impl FnOnce(&mut MockHandleInfo)) {
        let mut state = self.state.lock();
        state.calls.push(call);
        if let Some(info) = state.handles.get_mut(self.id) {
            update(info);
        }
    }
}

impl AudioHandle for MockHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        let rejected = self.behavior == MockBehavior::RejectPlay;
        self.record(MockCall::Play { handle: self.id }, |info| info.playing = !rejected);
        if rejected {
            let source = self
                .state
                .lock()
                .handles
                .get(self.id)
                .map(|h| h.source.clone())
                .unwrap_or_default();
            return Err(MediaError::Play {
                source_path: source,
                reason: "autoplay blocked".to_string(),
            });
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.record(MockCall::Pause { handle: self.id }, |info| info.playing = false);
    }

    fn rewind(&mut self) {
        self.record(MockCall::Rewind { handle: self.id }, |_| {});
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(MockCall::Volume { handle: self.id, volume }, |info| info.volume = volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.record(MockCall::Looping { handle: self.id, looping }, |info| info.looping = looping);
    }

    fn detach(&mut self) {
        self.record(MockCall::Detach { handle: self.id }, |info| {
            info.playing = false;
            info.detached = true;
        });
    }
}
