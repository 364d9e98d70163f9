//! Operation runner.
//!
//! # Threading
//!
//! The engine is blocking and may run for minutes, so it never touches the
//! async runtime: each run owns a named OS thread and reports its result
//! through a oneshot channel. Only one run is active per runner.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::oneshot;

use modpkg_core::{
    AppEvent, AppEventEmitter, MigrationEngine, OperationError, OperationKind, OperationRequest,
    SharedConnection,
};

use super::feedback::{RunControl, RunFeedback};

/// Time a cancelled operation gets to stop before it is abandoned.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

/// How a cancellation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The worker stopped (or nothing was running).
    Stopped,
    /// The worker did not stop in time and was detached.
    Abandoned,
}

struct ActiveRun {
    control: Arc<RunControl>,
    done: Option<oneshot::Receiver<Result<(), OperationError>>>,
    thread: JoinHandle<()>,
}

/// Runs migration operations on a background thread.
pub struct OperationRunner {
    emitter: Box<dyn AppEventEmitter>,
    active: Mutex<Option<ActiveRun>>,
    last_error: Arc<Mutex<Option<OperationError>>>,
}

impl OperationRunner {
    pub fn new(emitter: Box<dyn AppEventEmitter>) -> Self {
        Self {
            emitter,
            active: Mutex::new(None),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Start `request` with `engine` on `connection`.
    ///
    /// Progress and completion are reported as `OperationProgress` and
    /// `OperationFinished` events.
    ///
    /// # Errors
    ///
    /// - `ConfigMismatch` if the engine is configured for another module
    /// - `Busy` if an operation is still running
    /// - `Other` if the worker thread cannot be spawned
    pub fn start(
        &self,
        engine: Box<dyn MigrationEngine>,
        connection: SharedConnection,
        request: OperationRequest,
    ) -> Result<(), OperationError> {
        if engine.module_id() != request.module_id {
            return Err(OperationError::ConfigMismatch {
                expected: request.module_id,
                found: engine.module_id().to_string(),
            });
        }

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|run| !run.thread.is_finished()) {
            return Err(OperationError::Busy);
        }

        let control = Arc::new(RunControl::default());
        let (tx, rx) = oneshot::channel();
        let worker = Worker {
            engine,
            connection,
            request,
            control: Arc::clone(&control),
            emitter: self.emitter.clone_box(),
            last_error: Arc::clone(&self.last_error),
        };

        tracing::info!(
            target: "modpkg.operation",
            module = %worker.request.module_id,
            operation = worker.request.kind.as_str(),
            "Starting operation"
        );

        let thread = std::thread::Builder::new()
            .name(format!("modpkg-{}", worker.request.kind.as_str()))
            .spawn(move || {
                let result = worker.run();
                // Receiver may be gone if nobody waits.
                let _ = tx.send(result);
            })
            .map_err(|e| OperationError::other(format!("Failed to spawn worker: {e}")))?;

        *active = Some(ActiveRun {
            control,
            done: Some(rx),
            thread,
        });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|run| !run.thread.is_finished())
    }

    /// Ask the running engine to stop at its next safe point.
    pub fn cancel(&self) {
        if let Some(run) = self.lock_active().as_ref() {
            run.control.cancel();
        }
    }

    /// Wait for the current operation and return its result.
    ///
    /// Returns `Ok(())` when nothing is running.
    pub async fn wait(&self) -> Result<(), OperationError> {
        let Some((control, done)) = self.take_receiver() else {
            return Ok(());
        };
        let result = done
            .await
            .unwrap_or_else(|_| Err(OperationError::other("Worker exited without a result")));
        self.clear_if_current(&control);
        result
    }

    /// Cancel the current operation and wait up to `timeout` for it to stop.
    ///
    /// A worker still running after `timeout` is abandoned: it is detached,
    /// its later events are dropped and it will not commit. The database may
    /// be left in an inconsistent state. A worker that already began committing
    /// is waited for instead and reported as stopped.
    pub async fn cancel_and_wait(&self, timeout: Duration) -> CancelOutcome {
        let Some((control, mut done)) = self.take_receiver() else {
            return CancelOutcome::Stopped;
        };
        control.cancel();

        if tokio::time::timeout(timeout, &mut done).await.is_ok() {
            self.clear_if_current(&control);
            return CancelOutcome::Stopped;
        }

        if !control.abandon() {
            tracing::info!(target: "modpkg.operation", "Operation is committing; waiting for it to finish");
            // Result delivered to `last_error` by the worker.
            let _ = done.await;
            self.clear_if_current(&control);
            return CancelOutcome::Stopped;
        }
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(OperationError::Abandoned);
        self.clear_if_current(&control);
        tracing::warn!(
            target: "modpkg.operation",
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Operation did not stop after cancellation; abandoning worker. \
             The database may be left in an inconsistent state"
        );
        CancelOutcome::Abandoned
    }

    /// Error of the last finished operation.
    pub fn last_error(&self) -> Option<OperationError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_receiver(
        &self,
    ) -> Option<(Arc<RunControl>, oneshot::Receiver<Result<(), OperationError>>)> {
        let mut active = self.lock_active();
        let run = active.as_mut()?;
        let done = run.done.take()?;
        Some((Arc::clone(&run.control), done))
    }

    /// Forget the active run; dropping its handle detaches the thread.
    fn clear_if_current(&self, control: &Arc<RunControl>) {
        let mut active = self.lock_active();
        if active
            .as_ref()
            .is_some_and(|run| Arc::ptr_eq(&run.control, control))
        {
            *active = None;
        }
    }
}

impl Drop for OperationRunner {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    engine: Box<dyn MigrationEngine>,
    connection: SharedConnection,
    request: OperationRequest,
    control: Arc<RunControl>,
    emitter: Box<dyn AppEventEmitter>,
    last_error: Arc<Mutex<Option<OperationError>>>,
}

impl Worker {
    fn run(mut self) -> Result<(), OperationError> {
        let feedback = RunFeedback::new(Arc::clone(&self.control), self.emitter.clone_box());
        let outcome = self.call_engine(&feedback);
        let result = self.settle(outcome);

        if self.control.is_abandoned() {
            tracing::warn!(target: "modpkg.operation", "Abandoned operation returned; result discarded");
            return Err(OperationError::Abandoned);
        }

        match &result {
            Ok(()) => tracing::info!(target: "modpkg.operation", "Operation completed"),
            Err(e) if e.is_cancelled() => tracing::info!(target: "modpkg.operation", "Operation cancelled"),
            Err(e) => tracing::error!(target: "modpkg.operation", error = %e, "Operation failed"),
        }
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = result.as_ref().err().cloned();
        self.emitter.emit(AppEvent::operation_finished(
            result.is_ok(),
            result.as_ref().err().map(ToString::to_string),
        ));
        result
    }

    fn call_engine(&mut self, feedback: &RunFeedback) -> anyhow::Result<()> {
        let Self {
            engine,
            connection,
            request,
            ..
        } = self;
        let params = &request.parameters;
        let options = &request.options;

        match &request.kind {
            OperationKind::Install { demo_data } => {
                engine.install(connection, params, feedback, options)?;
                if let Some(name) = demo_data {
                    engine.install_demo_data(connection, name, params, feedback)?;
                }
                Ok(())
            }
            OperationKind::Upgrade => engine.upgrade(connection, params, feedback, options),
            OperationKind::Uninstall => engine.uninstall(connection, params, feedback, options),
            OperationKind::Roles => engine.create_roles(connection, feedback, true),
        }
    }

    /// Commit or roll back according to the engine outcome.
    fn settle(&self, outcome: anyhow::Result<()>) -> Result<(), OperationError> {
        if self.control.is_abandoned() {
            return Err(OperationError::Abandoned);
        }

        let cancelled = self.control.is_cancelled();
        match outcome {
            Ok(()) if !cancelled => {
                if self.request.options.commit {
                    let mut connection =
                        self.connection.lock().unwrap_or_else(PoisonError::into_inner);
                    if !self.control.begin_commit() {
                        return Err(OperationError::Abandoned);
                    }
                    let commit = connection.commit();
                    drop(connection);
                    if let Err(e) = commit {
                        self.rollback();
                        return Err(OperationError::engine(&e.context("Commit failed")));
                    }
                }
                Ok(())
            }
            Ok(()) => {
                self.rollback();
                Err(OperationError::Cancelled)
            }
            Err(e) => {
                self.rollback();
                if cancelled {
                    tracing::debug!(target: "modpkg.operation", error = %format!("{e:#}"), "Engine stopped after cancellation");
                    Err(OperationError::Cancelled)
                } else {
                    Err(OperationError::engine(&e))
                }
            }
        }
    }

    fn rollback(&self) {
        let result = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rollback();
        if let Err(e) = result {
            tracing::error!(target: "modpkg.operation", error = %format!("{e:#}"), "Rollback failed");
        }
    }
}
