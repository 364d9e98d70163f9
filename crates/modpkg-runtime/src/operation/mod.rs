//! Background migration operations.

mod feedback;
mod runner;

pub use runner::{CancelOutcome, DEFAULT_CANCEL_TIMEOUT, OperationRunner};
