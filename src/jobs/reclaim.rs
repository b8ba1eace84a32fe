use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{JobStore, WorkerRegistry};
use crate::error::{AccessError, Result};

/// Worker identity recovered from a job's `locked_by` field.
///
/// Format v1: whitespace-separated tokens, at least two. The first token is
/// the worker id. The pid is the value of a `pid:` token if one exists,
/// otherwise whatever follows the last `:` of the last token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOwner {
    pub worker: String,
    pub pid: String,
}

impl LockOwner {
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || AccessError::MalformedLockOwner(raw.to_string());
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let [worker, .., last] = tokens.as_slice() else {
            return Err(malformed());
        };

        let pid = tokens
            .iter()
            .find_map(|t| t.strip_prefix("pid:"))
            .or_else(|| last.rsplit_once(':').map(|(_, pid)| pid))
            .filter(|pid| !pid.is_empty())
            .ok_or_else(malformed)?;

        Ok(Self {
            worker: worker.to_string(),
            pid: pid.to_string(),
        })
    }

    /// Alive means the same worker slot AND the same process.
    pub fn is_alive_in(&self, live: &HashMap<String, String>) -> bool {
        live.get(&self.worker).is_some_and(|pid| *pid == self.pid)
    }
}

/// Best-effort name of the method a serialized job handler will invoke.
pub fn handler_method_name(handler: &str) -> Option<&str> {
    handler
        .lines()
        .find_map(|line| line.trim().strip_prefix("method_name:"))
        .map(|value| value.trim().trim_start_matches(':'))
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Locked jobs looked at.
    pub examined: usize,
    /// Orphans whose lock was cleared.
    pub unlocked: usize,
    /// Jobs skipped because `locked_by` could not be parsed.
    pub malformed: usize,
    /// Orphans whose lock could not be cleared.
    pub failed: usize,
}

pub struct OrphanedJobReclaimer {
    registry: Arc<dyn WorkerRegistry>,
    store: Arc<dyn JobStore>,
}

impl OrphanedJobReclaimer {
    pub fn new(registry: Arc<dyn WorkerRegistry>, store: Arc<dyn JobStore>) -> Self {
        Self { registry, store }
    }

    /// Unlock every locked job whose worker is not in the liveness snapshot.
    ///
    /// The snapshot is read once, before any job is looked at.
    pub fn reclaim(&self) -> Result<ReclaimReport> {
        let pass_id = Uuid::new_v4();
        let live = self.registry.live_workers()?;
        let jobs = self.store.find_locked_jobs()?;
        let mut report = ReclaimReport::default();

        for job in jobs.iter().filter(|job| job.is_locked()) {
            report.examined += 1;
            let raw = job.locked_by.as_deref().unwrap_or_default();

            let owner = match LockOwner::parse(raw) {
                Ok(owner) => owner,
                Err(e) => {
                    warn!(%pass_id, job_id = %job.id, error = %e, class = %e.class(), "skipping job");
                    report.malformed += 1;
                    continue;
                }
            };

            if owner.is_alive_in(&live) {
                continue;
            }

            match self.store.clear_lock(&job.id) {
                Ok(()) => {
                    report.unlocked += 1;
                    info!(
                        %pass_id,
                        job_id = %job.id,
                        method = handler_method_name(&job.handler).unwrap_or("unknown"),
                        worker = %owner.worker,
                        pid = %owner.pid,
                        enqueued_at = %job.created_at,
                        "restarting orphaned job"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%pass_id, job_id = %job.id, error = %e, "failed to unlock orphaned job");
                }
            }
        }

        info!(
            %pass_id,
            examined = report.examined,
            unlocked = report.unlocked,
            malformed = report.malformed,
            failed = report.failed,
            "reclaim pass finished"
        );
        Ok(report)
    }
}
