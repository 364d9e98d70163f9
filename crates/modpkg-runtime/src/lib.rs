#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod operation;

pub use operation::{CancelOutcome, DEFAULT_CANCEL_TIMEOUT, OperationRunner};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
