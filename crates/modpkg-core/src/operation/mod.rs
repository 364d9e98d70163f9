//! Migration operation types shared by the runner and its callers.

mod errors;
mod types;

pub use errors::OperationError;
pub use types::{OperationKind, OperationOptions, OperationRequest};
