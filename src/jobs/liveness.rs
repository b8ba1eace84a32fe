use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::Result;

/// Source of the workers that are currently running.
pub trait WorkerRegistry: Send + Sync {
    /// Snapshot of worker id to process id.
    fn live_workers(&self) -> Result<HashMap<String, String>>;
}

/// Reads `<workerId>.pid` files from a directory; each holds the pid as text.
pub struct PidDirRegistry {
    dir: PathBuf,
}

impl PidDirRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WorkerRegistry for PidDirRegistry {
    fn live_workers(&self) -> Result<HashMap<String, String>> {
        let mut workers = HashMap::new();

        for entry in fs::read_dir(&self.dir)?.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let Some(worker) = name.strip_suffix(".pid") else {
                continue;
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match fs::read_to_string(entry.path()) {
                Ok(contents) => {
                    let pid = contents.trim();
                    if pid.is_empty() {
                        warn!(worker, "empty pid file, skipping");
                        continue;
                    }
                    workers.insert(worker.to_string(), pid.to_string());
                }
                Err(e) => warn!(worker, error = %e, "unreadable pid file, skipping"),
            }
        }

        debug!(dir = %self.dir.display(), workers = workers.len(), "worker liveness snapshot");
        Ok(workers)
    }
}
