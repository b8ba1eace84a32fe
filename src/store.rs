//! JSON-file adapters for the access state, the workspace directory and
//! the job store.
//!
//! Writes go to a temporary file in the same directory and are renamed
//! into place, so readers never observe a half-written document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AccessError, Result};
use crate::jobs::{JobRecord, JobStore};
use crate::state_machine::AccessState;
use crate::workspace::{Workspace, WorkspaceDirectory, WorkspaceFilter};

/// Persistence of the singleton [`AccessState`] record.
///
/// Last write wins; every transition is idempotent, so no locking is
/// required between concurrent reconcilers.
pub trait AccessStateStore: Send + Sync {
    fn load(&self) -> Result<Option<AccessState>>;
    fn save(&self, state: &AccessState) -> Result<()>;
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AccessError::Io(e.error))?;
    Ok(())
}

pub struct FileAccessStateStore {
    path: PathBuf,
}

impl FileAccessStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AccessStateStore for FileAccessStateStore {
    fn load(&self) -> Result<Option<AccessState>> {
        read_json(&self.path)
    }

    fn save(&self, state: &AccessState) -> Result<()> {
        write_json_atomic(&self.path, state)?;
        debug!(path = %self.path.display(), value = %state.value, "access state saved");
        Ok(())
    }
}

/// Workspace export maintained by the application, a JSON array of [`Workspace`].
pub struct FileWorkspaceDirectory {
    path: PathBuf,
}

impl FileWorkspaceDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorkspaceDirectory for FileWorkspaceDirectory {
    fn list_workspaces(&self, filter: &WorkspaceFilter) -> Result<Vec<Workspace>> {
        let workspaces: Vec<Workspace> = read_json(&self.path)?.ok_or_else(|| {
            AccessError::Store(format!("workspace export {} not found", self.path.display()))
        })?;
        Ok(workspaces.into_iter().filter(|ws| filter.matches(ws)).collect())
    }
}

/// Job queue table as a JSON array of [`JobRecord`].
pub struct FileJobStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<JobRecord>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

impl JobStore for FileJobStore {
    fn find_locked_jobs(&self) -> Result<Vec<JobRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(JobRecord::is_locked)
            .collect())
    }

    fn clear_lock(&self, job_id: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AccessError::Store("job store lock poisoned".to_string()))?;

        let mut jobs = self.read_all()?;
        let job = jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| AccessError::Store(format!("job {job_id} not found")))?;
        job.locked_by = None;
        job.locked_at = None;
        write_json_atomic(&self.path, &jobs)
    }
}
