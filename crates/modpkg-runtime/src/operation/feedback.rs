use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use modpkg_core::{AppEvent, AppEventEmitter, MigrationFeedback};

/// Ownership of a run's outcome. `Committing` and `Abandoned` exclude each
/// other: whichever is claimed first wins.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Running,
    Committing,
    Abandoned,
}

/// Flags shared between a runner and one worker thread.
#[derive(Debug, Default)]
pub(super) struct RunControl {
    cancelled: AtomicBool,
    phase: Mutex<Phase>,
}

impl RunControl {
    pub(super) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(super) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Detach the worker: it keeps running but may no longer emit or commit.
    ///
    /// Returns `false` if the worker already began committing.
    pub(super) fn abandon(&self) -> bool {
        self.cancel();
        let mut phase = self.phase();
        if *phase == Phase::Committing {
            return false;
        }
        *phase = Phase::Abandoned;
        true
    }

    pub(super) fn is_abandoned(&self) -> bool {
        *self.phase() == Phase::Abandoned
    }

    /// Claim the right to commit. Returns `false` once abandoned.
    pub(super) fn begin_commit(&self) -> bool {
        let mut phase = self.phase();
        if *phase == Phase::Abandoned {
            return false;
        }
        *phase = Phase::Committing;
        true
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feedback handed to the engine for one run.
pub(super) struct RunFeedback {
    control: Arc<RunControl>,
    emitter: Box<dyn AppEventEmitter>,
    steps: AtomicU64,
}

impl RunFeedback {
    pub(super) fn new(control: Arc<RunControl>, emitter: Box<dyn AppEventEmitter>) -> Self {
        Self {
            control,
            emitter,
            steps: AtomicU64::new(0),
        }
    }
}

impl MigrationFeedback for RunFeedback {
    fn report_progress(&self, message: &str, current: u64, total: u64) {
        if self.control.is_abandoned() {
            return;
        }
        let (current, total) = if current == 0 && total == 0 {
            (self.steps.fetch_add(1, Ordering::Relaxed) + 1, 0)
        } else {
            (current, total)
        };
        tracing::debug!(target: "modpkg.operation", current, total, "{message}");
        self.emitter
            .emit(AppEvent::operation_progress(message, current, total));
    }

    fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }
}
