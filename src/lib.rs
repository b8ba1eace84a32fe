//! Platform access reconciliation.
//!
//! Keeps a managed platform's access flag in step with its health checks,
//! pushes bulk permission changes to managed workspaces when the flag
//! moves, and unlocks background jobs orphaned by dead workers.

pub mod bulk;
pub mod config;
pub mod error;
pub mod jobs;
pub mod notifier;
pub mod platform;
pub mod reconciler;
pub mod service;
pub mod state_machine;
pub mod store;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use bulk::{BulkPermissionUpdater, BulkReport};
pub use error::{AccessError, ErrorClass, Result};
pub use jobs::{OrphanedJobReclaimer, ReclaimReport};
pub use reconciler::{AccessReconciler, ReconcileOutcome};
pub use state_machine::{AccessState, AccessStateMachine, AccessValue};
