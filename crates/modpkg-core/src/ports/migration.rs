//! Migration engine ports.
//!
//! The schema migration engine and the database connection are owned by the
//! host application. The runner in `modpkg-runtime` only drives them; it never
//! opens or closes a connection.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::operation::OperationOptions;

/// Free-form engine parameters (the module's "parameters" form).
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// A transactional database connection handed in by the host.
pub trait DatabaseConnection: Send {
    /// Commit the current transaction.
    fn commit(&mut self) -> anyhow::Result<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> anyhow::Result<()>;
}

/// Connection shared between the host and the worker running an operation.
pub type SharedConnection = Arc<Mutex<dyn DatabaseConnection>>;

/// Callback object handed to the migration engine.
///
/// The engine reports progress through it and polls it for cancellation at
/// its own safe points; nothing interrupts a running statement.
pub trait MigrationFeedback: Send + Sync {
    /// Report progress. When both `current` and `total` are zero the
    /// implementation advances its own step counter instead.
    fn report_progress(&self, message: &str, current: u64, total: u64);

    /// Whether the caller asked the operation to stop.
    fn is_cancelled(&self) -> bool;
}

/// The external schema migration engine, configured for one module.
///
/// Calls are blocking and run on a dedicated worker thread. None of them
/// commit: the runner commits or rolls back the shared connection once the
/// call returns.
pub trait MigrationEngine: Send {
    /// Identifier of the module the engine configuration belongs to.
    fn module_id(&self) -> &str;

    fn install(
        &mut self,
        connection: &SharedConnection,
        parameters: &Parameters,
        feedback: &dyn MigrationFeedback,
        options: &OperationOptions,
    ) -> anyhow::Result<()>;

    fn upgrade(
        &mut self,
        connection: &SharedConnection,
        parameters: &Parameters,
        feedback: &dyn MigrationFeedback,
        options: &OperationOptions,
    ) -> anyhow::Result<()>;

    fn uninstall(
        &mut self,
        connection: &SharedConnection,
        parameters: &Parameters,
        feedback: &dyn MigrationFeedback,
        options: &OperationOptions,
    ) -> anyhow::Result<()>;

    /// Load a named demo data set on top of an installed module.
    fn install_demo_data(
        &mut self,
        connection: &SharedConnection,
        name: &str,
        parameters: &Parameters,
        feedback: &dyn MigrationFeedback,
    ) -> anyhow::Result<()>;

    /// Create the module's database roles, optionally granting privileges.
    fn create_roles(
        &mut self,
        connection: &SharedConnection,
        feedback: &dyn MigrationFeedback,
        grant: bool,
    ) -> anyhow::Result<()>;
}
