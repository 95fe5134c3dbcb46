/*!
 * Events the engine publishes to the host UI.
 *
 * Delivery is synchronous and in emission order: every subscriber gets its
 * own unbounded channel and `emit` pushes into each one before returning.
 */

use log::trace;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::app_config::PlayMode;
use crate::assets::MediaSource;
use crate::scenario::{Scene, SceneId, Subtitle};

/// Host-facing playback event
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A new scene became current. Sent before its first tick is processed.
    SceneChanged {
        scene: Scene,
        /// Resolved background media, `None` when it could not be resolved
        background: Option<MediaSource>,
    },
    /// Elapsed scene time, at most once per tick
    TimeUpdate { elapsed_ms: u64 },
    /// The displayed subtitle changed; `None` clears it
    SubtitleChanged { subtitle: Option<Subtitle> },
    /// The current scene reached its effective duration
    SceneEnded { scene_id: SceneId },
    /// The story reached a terminal scene
    End,
    PlayModeChanged(PlayMode),
    PauseChanged(bool),
}

/// Fan-out of playback events to any number of subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<PlaybackEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber, dropping closed ones
    pub fn emit(&mut self, event: PlaybackEvent) {
        trace!("Emitting {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
