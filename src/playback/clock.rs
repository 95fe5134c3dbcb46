/*!
 * Scene clock.
 *
 * Elapsed time is `now - origin - accumulated_pause`. Paused wall time is
 * never counted, and every subtraction saturates so elapsed can never go
 * negative.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Monotonic time source
pub trait TimeSource: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Time source backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Time source that only moves when told to. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Move time forward by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Total time advanced so far
    pub fn offset(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

/// Pause-aware elapsed time accumulator for one scene
pub struct PlaybackClock {
    time: Arc<dyn TimeSource>,
    origin: Option<Instant>,
    paused_at: Option<Instant>,
    accumulated_pause: Duration,
}

impl PlaybackClock {
    /// Create a stopped clock
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            origin: None,
            paused_at: None,
            accumulated_pause: Duration::ZERO,
        }
    }

    /// Record the origin instant and start running
    pub fn start(&mut self) {
        let now = self.time.now();
        self.origin = Some(now);
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
    }

    /// Record the origin instant but hold elapsed at zero until `resume`
    pub fn start_paused(&mut self) {
        self.start();
        self.paused_at = self.origin;
    }

    /// Stop counting. No-op when already paused or not started.
    pub fn pause(&mut self) {
        if self.origin.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(self.time.now());
        }
    }

    /// Resume counting, discounting the paused interval
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            let now = self.time.now();
            self.accumulated_pause += now.saturating_duration_since(paused_at);
        }
    }

    /// Reinitialize for a new scene
    pub fn reset(&mut self) {
        self.origin = None;
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
    }

    /// Elapsed running time. Zero before `start`.
    pub fn elapsed(&self) -> Duration {
        let Some(origin) = self.origin else {
            return Duration::ZERO;
        };
        let reference = self.paused_at.unwrap_or_else(|| self.time.now());
        reference
            .saturating_duration_since(origin)
            .saturating_sub(self.accumulated_pause)
    }

    /// Elapsed running time in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.origin.is_some()
    }

    /// Total paused time discounted so far, excluding an ongoing pause
    pub fn accumulated_pause(&self) -> Duration {
        self.accumulated_pause
    }
}
