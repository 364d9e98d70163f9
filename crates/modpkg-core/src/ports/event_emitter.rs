//! Event emitter trait for delivering events to the caller.
//!
//! Implementations handle transport details (channels, GUI signal bridges,
//! progress bars, ...).

use tokio::sync::mpsc;

use crate::events::AppEvent;

/// Trait for emitting application events.
///
/// Every asynchronous operation receives an emitter at construction; there is
/// no process-wide listener registry.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - `ChannelEmitter` - Forwards events into a tokio channel
pub trait AppEventEmitter: Send + Sync {
    /// Emit an application event.
    ///
    /// This method should not block.
    fn emit(&self, event: AppEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn AppEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl AppEventEmitter for NoopEmitter {
    fn emit(&self, _event: AppEvent) {}

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that forwards every event into an unbounded tokio channel.
///
/// Events emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AppEventEmitter for ChannelEmitter {
    fn emit(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
