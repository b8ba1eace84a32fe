//! Orphaned background job recovery.
//!
//! [`OrphanedJobReclaimer`] compares locked jobs in a [`JobStore`] with one
//! snapshot of the [`WorkerRegistry`] and unlocks jobs whose worker is gone.

mod liveness;
mod reclaim;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use liveness::{PidDirRegistry, WorkerRegistry};
pub use reclaim::{LockOwner, OrphanedJobReclaimer, ReclaimReport, handler_method_name};

/// A job-queue record. Only the two lock fields are ever written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(default)]
    pub locked_by: Option<String>,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    /// Serialized job payload, only decoded for log messages.
    #[serde(default)]
    pub handler: String,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn is_locked(&self) -> bool {
        self.locked_by.as_deref().is_some_and(|owner| !owner.trim().is_empty())
    }
}

pub trait JobStore: Send + Sync {
    fn find_locked_jobs(&self) -> Result<Vec<JobRecord>>;
    /// Clears `locked_by` and `locked_at` of one job.
    fn clear_lock(&self, job_id: &str) -> Result<()>;
}
