//! In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AccessError, Result};
use crate::jobs::{JobRecord, JobStore, WorkerRegistry};
use crate::notifier::{AdminAlert, Notifier};
use crate::platform::{AclEntry, HealthProbe, PermissionApi, PlatformError, PlatformStatus};
use crate::state_machine::AccessState;
use crate::store::AccessStateStore;
use crate::workspace::{Workspace, WorkspaceDirectory, WorkspaceFilter};

pub fn workspace(project: &str, name: &str) -> Workspace {
    Workspace {
        project: project.into(),
        name: name.into(),
        owner_email: "owner@example.com".into(),
        queued_for_deletion: false,
        shares: Vec::new(),
    }
}

pub fn locked_job(id: &str, owner: &str) -> JobRecord {
    let now = Utc::now();
    JobRecord {
        id: id.into(),
        locked_by: Some(owner.into()),
        locked_at: Some(now),
        handler: "--- !object:ReportJob\nmethod_name: :perform\n".into(),
        created_at: now,
    }
}

#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<AccessState>>,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn snapshot(&self) -> Option<AccessState> {
        self.state.lock().unwrap().clone()
    }

    /// Seeds the record without counting as a save.
    pub fn put(&self, state: AccessState) {
        *self.state.lock().unwrap() = Some(state);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl AccessStateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<AccessState>> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &AccessState) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

/// Answers probes from a script; once exhausted the platform is available.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(script: &[bool]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn status(&self) -> PlatformStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
        if ok {
            PlatformStatus {
                ok,
                systems: Default::default(),
            }
        } else {
            PlatformStatus::unreachable("scripted outage")
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AdminAlert>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<AdminAlert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_admin_alert(&self, alert: &AdminAlert) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AccessError::Notify("mail relay refused".into()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Records every push attempt in order; fails for configured principals.
#[derive(Default)]
pub struct RecordingPermissionApi {
    calls: Mutex<Vec<(String, String, AclEntry)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingPermissionApi {
    pub fn failing_for(principals: &[&str]) -> Self {
        let api = Self::default();
        for p in principals {
            api.fail_for(p);
        }
        api
    }

    pub fn fail_for(&self, principal: &str) {
        self.failing.lock().unwrap().insert(principal.to_string());
    }

    pub fn calls_for(&self, project: &str, workspace: &str) -> Vec<AclEntry> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, w, _)| p == project && w == workspace)
            .map(|(_, _, entry)| entry.clone())
            .collect()
    }

    pub fn all_calls(&self) -> Vec<AclEntry> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, entry)| entry.clone())
            .collect()
    }
}

#[async_trait]
impl PermissionApi for RecordingPermissionApi {
    async fn push_acl(
        &self,
        project: &str,
        workspace: &str,
        entry: &AclEntry,
    ) -> std::result::Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push((project.to_string(), workspace.to_string(), entry.clone()));
        if self.failing.lock().unwrap().contains(&entry.email) {
            return Err(PlatformError::ApiError {
                status: 500,
                message: "acl rejected".into(),
            });
        }
        Ok(())
    }
}

/// Returns every workspace regardless of the filter, so callers must
/// apply the eligibility rules themselves.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    workspaces: Vec<Workspace>,
    unavailable: bool,
}

impl MemoryDirectory {
    pub fn new(workspaces: Vec<Workspace>) -> Self {
        Self {
            workspaces,
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            workspaces: Vec::new(),
            unavailable: true,
        }
    }
}

impl WorkspaceDirectory for MemoryDirectory {
    fn list_workspaces(&self, _filter: &WorkspaceFilter) -> Result<Vec<Workspace>> {
        if self.unavailable {
            return Err(AccessError::Store("directory offline".into()));
        }
        Ok(self.workspaces.clone())
    }
}

pub struct MemoryJobStore {
    jobs: Mutex<Vec<JobRecord>>,
    failing: HashSet<String>,
}

impl MemoryJobStore {
    pub fn new(jobs: Vec<JobRecord>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, job_id: &str) -> Self {
        self.failing.insert(job_id.to_string());
        self
    }

    pub fn job(&self, job_id: &str) -> JobRecord {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .unwrap()
    }
}

impl JobStore for MemoryJobStore {
    fn find_locked_jobs(&self) -> Result<Vec<JobRecord>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|job| job.is_locked())
            .cloned()
            .collect())
    }

    fn clear_lock(&self, job_id: &str) -> Result<()> {
        if self.failing.contains(job_id) {
            return Err(AccessError::Store(format!("job {job_id} is write-locked")));
        }
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| AccessError::Store(format!("job {job_id} not found")))?;
        job.locked_by = None;
        job.locked_at = None;
        Ok(())
    }
}

pub struct StaticRegistry {
    workers: HashMap<String, String>,
    unavailable: bool,
    reads: AtomicUsize,
}

impl StaticRegistry {
    pub fn new(workers: &[(&str, &str)]) -> Self {
        Self {
            workers: workers
                .iter()
                .map(|(w, p)| (w.to_string(), p.to_string()))
                .collect(),
            unavailable: false,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(&[])
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl WorkerRegistry for StaticRegistry {
    fn live_workers(&self) -> Result<HashMap<String, String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(AccessError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "pid directory missing",
            )));
        }
        Ok(self.workers.clone())
    }
}
