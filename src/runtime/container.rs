// ABOUTME: Container operations trait and the data it exchanges.
// ABOUTME: Inspect, create, start, stop, remove, and list containers by name or ID.

use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// Container lifecycle operations.
///
/// `inspect_container` accepts a name or an ID. A missing container is
/// always reported as [`ContainerError::NotFound`], never as a generic
/// runtime failure, because callers branch on it.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Get the current state of a container.
    async fn inspect_container(&self, name_or_id: &str) -> Result<ContainerRecord, ContainerError>;

    /// Create a container from the given spec. The container is not started.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Stop a running container, killing it after `timeout`.
    async fn stop_container(&self, id: &ContainerId, timeout: Duration)
    -> Result<(), ContainerError>;

    /// Remove a stopped container.
    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// What to create when a container is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    /// Full image reference, including tag.
    pub image: String,
    pub user: Option<String>,
    /// `KEY=VALUE` entries.
    pub env: Vec<String>,
    pub labels: HashMap<String, String>,
    /// `host:container` bind mounts.
    pub binds: Vec<String>,
    /// `name:alias` legacy container links.
    pub links: Vec<String>,
}

/// Runtime-observed state of a single container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub running: bool,
    /// Address on the container network, if the container has one.
    pub ip_address: Option<IpAddr>,
    pub labels: HashMap<String, String>,
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    /// Every container, running or not.
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }
}

/// Summary information about a listed container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    /// Primary name without the leading slash.
    pub name: String,
    pub image: String,
    pub state: String,
    pub labels: HashMap<String, String>,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ContainerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound(_))
    }
}
