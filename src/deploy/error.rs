// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers container, config, readiness, reload, cleanup and lock failures.

use crate::probe::ProbeError;
use crate::proxy::ProxyError;
use crate::runtime::ContainerError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Creating, starting or replacing a container failed.
    #[error("failed to ensure container {container} is running: {source}")]
    EnsureRunning {
        container: String,
        #[source]
        source: ContainerError,
    },

    /// The release environment file could not be read.
    #[error("failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or removing an nginx config, or signalling nginx, failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// The release never answered its health endpoint.
    #[error("release {container} did not become ready: {source}")]
    NotReady {
        container: String,
        #[source]
        source: ProbeError,
    },

    /// Persisting the promoted tag failed.
    #[error("failed to record applied tag in {}: {source}", path.display())]
    TagFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing containers for cleanup failed.
    #[error("failed to list containers: {0}")]
    List(#[source] ContainerError),

    /// Removing a retired container failed.
    #[error("failed to remove container {container}: {source}")]
    Remove {
        container: String,
        #[source]
        source: ContainerError,
    },

    /// Several cleanup steps failed.
    #[error(transparent)]
    Cleanup(CleanupErrors),

    /// Another deploy holds the lock.
    #[error("deploy lock held by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    /// The lock file could not be created, read or removed.
    #[error("deploy lock error: {0}")]
    Lock(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Container runtime refused an operation.
    Runtime,
    /// Release did not become ready in time.
    ReadinessTimeout,
    /// A config, env or tag file could not be read or written.
    FileSystem,
    /// nginx could not be signalled.
    Reload,
    /// More than one cleanup step failed.
    Cleanup,
    /// Another deploy is running.
    LockHeld,
    /// The lock file itself is unusable.
    Lock,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::EnsureRunning { .. } | DeployError::List(_) | DeployError::Remove { .. } => {
                DeployErrorKind::Runtime
            }
            DeployError::NotReady { .. } => DeployErrorKind::ReadinessTimeout,
            DeployError::Proxy(ProxyError::NoAddress { .. }) => DeployErrorKind::Runtime,
            DeployError::Proxy(e) if e.is_reload() => DeployErrorKind::Reload,
            DeployError::Proxy(_) | DeployError::EnvFile { .. } | DeployError::TagFile { .. } => {
                DeployErrorKind::FileSystem
            }
            DeployError::Cleanup(_) => DeployErrorKind::Cleanup,
            DeployError::LockHeld { .. } => DeployErrorKind::LockHeld,
            DeployError::Lock(_) => DeployErrorKind::Lock,
        }
    }

    /// Collapse per-container cleanup failures into one result.
    ///
    /// No failures is success, a single failure is returned as is, and
    /// several become [`DeployError::Cleanup`].
    pub fn from_failures(mut failures: Vec<DeployError>) -> Result<(), DeployError> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(DeployError::Cleanup(CleanupErrors { failures })),
        }
    }

    /// Get the individual failures if this is an aggregated cleanup error.
    pub fn cleanup_failures(&self) -> Option<&[DeployError]> {
        match self {
            DeployError::Cleanup(errors) => Some(errors.failures()),
            _ => None,
        }
    }
}

/// Several independent cleanup failures reported together.
#[derive(Debug)]
pub struct CleanupErrors {
    failures: Vec<DeployError>,
}

impl CleanupErrors {
    pub fn failures(&self) -> &[DeployError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CleanupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cleanup errors: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CleanupErrors {}
