use std::time::{Duration, Instant};

use modpkg_core::{AppEvent, AppEventEmitter};

/// Minimum spacing between indeterminate progress events.
const INDETERMINATE_INTERVAL: Duration = Duration::from_millis(100);

/// Turns received byte counts into `PackagingProgress` events.
///
/// With a known total, an event is emitted whenever the integer percentage
/// changes. Without one, byte counts are reported at most every 100 ms.
pub struct ProgressTracker {
    expected_total: u64,
    received: u64,
    last_percent: Option<u64>,
    last_indeterminate: Option<Instant>,
    emitter: Box<dyn AppEventEmitter>,
}

impl ProgressTracker {
    pub fn new(expected_total: u64, emitter: Box<dyn AppEventEmitter>) -> Self {
        Self {
            expected_total,
            received: 0,
            last_percent: None,
            last_indeterminate: None,
            emitter,
        }
    }

    pub const fn is_indeterminate(&self) -> bool {
        self.expected_total == 0
    }

    /// Record `bytes` more bytes and emit if the visible value changed.
    pub fn advance(&mut self, bytes: u64) {
        self.received = self.received.saturating_add(bytes);
        self.emit(false);
    }

    /// Emit the current value regardless of throttling.
    pub fn finish(&mut self) {
        self.emit(true);
    }

    /// Report an artifact served from cache.
    pub fn mark_reused(&mut self) {
        self.emitter
            .emit(AppEvent::packaging_indeterminate(self.received));
    }

    fn percent(&self) -> u64 {
        let raw = self.received.saturating_mul(100) / self.expected_total;
        raw.min(100)
    }

    fn emit(&mut self, force: bool) {
        if self.is_indeterminate() {
            let now = Instant::now();
            let due = self
                .last_indeterminate
                .is_none_or(|last| now.duration_since(last) >= INDETERMINATE_INTERVAL);
            if force || due {
                self.last_indeterminate = Some(now);
                self.emitter
                    .emit(AppEvent::packaging_indeterminate(self.received));
            }
            return;
        }

        let percent = self.percent();
        if force || self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            #[allow(clippy::cast_precision_loss)]
            self.emitter
                .emit(AppEvent::packaging_progress(percent as f64, self.received));
        }
    }
}
