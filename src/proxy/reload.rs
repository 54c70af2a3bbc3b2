// ABOUTME: Proxy reload via SIGHUP to the PID recorded in nginx's pid file.
// ABOUTME: Unreadable, malformed or stale PIDs are surfaced, never retried.

use super::error::{ParsePidSnafu, ProxyError, ReadPidSnafu};
use async_trait::async_trait;
use snafu::ResultExt;
use std::path::{Path, PathBuf};

/// Makes the proxy pick up config changes.
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload(&self) -> Result<(), ProxyError>;
}

/// Reloads a proxy whose master process writes its PID to a file.
#[derive(Debug, Clone)]
pub struct PidFileReloader {
    pid_file: PathBuf,
}

impl PidFileReloader {
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
        }
    }
}

/// Read and validate the PID stored at `path`.
pub fn read_pid(path: &Path) -> Result<i32, ProxyError> {
    let contents = std::fs::read_to_string(path).context(ReadPidSnafu { path })?;
    let trimmed = contents.trim();

    match trimmed.parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => ParsePidSnafu {
            path,
            contents: trimmed,
        }
        .fail(),
    }
}

fn send_hangup(pid: i32) -> Result<(), ProxyError> {
    // SAFETY: kill(2) has no memory-safety preconditions; pid is positive so
    // the signal targets exactly one process.
    let rc = unsafe { libc::kill(pid, libc::SIGHUP) };
    if rc == 0 {
        Ok(())
    } else {
        Err(ProxyError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}

#[async_trait]
impl Reloader for PidFileReloader {
    async fn reload(&self) -> Result<(), ProxyError> {
        let pid = read_pid(&self.pid_file)?;
        send_hangup(pid)?;
        tracing::info!(pid, "sent SIGHUP to proxy");
        Ok(())
    }
}
