// ABOUTME: Deploy lock to prevent concurrent cutovers on one host.
// ABOUTME: Uses atomic file creation with lock info stored as JSON in the lock file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReleaseTag;

use super::DeployError;

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Tag being deployed.
    pub tag: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(tag: &ReleaseTag) -> Self {
        Self {
            holder: hostname(),
            pid: std::process::id(),
            started_at: Utc::now(),
            tag: tag.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Held by a process on this host that no longer exists.
    pub fn is_orphaned(&self) -> bool {
        self.holder == hostname() && !process_alive(self.pid)
    }
}

fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs the permission and existence checks only.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// A held deploy lock that releases on drop.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire the deploy lock at `path`.
    ///
    /// Creation uses `O_EXCL`, so two deploys cannot both succeed. An
    /// existing lock is broken when forced, stale (>1 hour), orphaned, or
    /// unreadable; otherwise the holder is reported.
    pub fn acquire(path: &Path, tag: &ReleaseTag, force: bool) -> Result<Self, DeployError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DeployError::Lock(format!(
                    "failed to create lock directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let lock_json = serde_json::to_string(&LockInfo::new(tag))
            .map_err(|e| DeployError::Lock(format!("failed to serialize lock: {}", e)))?;

        match create_exclusive(path, &lock_json) {
            Ok(()) => return Ok(Self::held(path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(DeployError::Lock(format!("failed to acquire lock: {}", e)));
            }
        }

        match Self::existing_lock(path) {
            Some(existing) if !force && !existing.is_stale() && !existing.is_orphaned() => {
                return Err(DeployError::LockHeld {
                    holder: existing.holder,
                    pid: existing.pid,
                    started_at: existing.started_at,
                });
            }
            Some(existing) => {
                tracing::warn!(
                    "Breaking lock held by {} (pid {}) since {}",
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
            }
            None => tracing::warn!("Lock info unreadable, breaking lock"),
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DeployError::Lock(format!("failed to break lock: {}", e)));
            }
        }

        match create_exclusive(path, &lock_json) {
            Ok(()) => Ok(Self::held(path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(DeployError::Lock(
                "lock acquired by another process during break".to_string(),
            )),
            Err(e) => Err(DeployError::Lock(format!("failed to acquire lock: {}", e))),
        }
    }

    fn held(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            released: false,
        }
    }

    fn existing_lock(path: &Path) -> Option<LockInfo> {
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(contents.trim()).ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), DeployError> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeployError::Lock(format!("failed to release lock: {}", e))),
        }
    }

    /// Release the lock once the guarded work has finished, passing its
    /// result through. A release failure is logged and never replaces the
    /// outcome of the work.
    pub fn release_after<T>(self, result: Result<T, DeployError>) -> Result<T, DeployError> {
        let path = self.path.clone();
        if let Err(e) = self.release() {
            tracing::warn!(path = %path.display(), "{}", e);
        }
        result
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn create_exclusive(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}
