// ABOUTME: Idempotent container management on top of ContainerOps.
// ABOUTME: ensure_running creates missing containers and replaces stopped ones, never restarting in place.

use super::container::{
    ContainerError, ContainerFilters, ContainerOps, ContainerRecord, ContainerSpec,
    ContainerSummary,
};
use crate::types::ContainerId;
use std::time::Duration;

/// Owns the runtime client for the lifetime of a deploy.
///
/// The client is built before the manager exists, so a broken runtime
/// endpoint fails up front instead of on the first operation.
pub struct ContainerManager<R> {
    runtime: R,
}

impl<R: ContainerOps> ContainerManager<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Make sure a container named `spec.name` is running.
    ///
    /// - missing: create from `spec` and start it
    /// - running: leave it alone
    /// - present but not running: remove it, then create and start fresh
    ///
    /// Returns the container's state after the call, including its address.
    pub async fn ensure_running(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerRecord, ContainerError> {
        match self.runtime.inspect_container(&spec.name).await {
            Ok(record) if record.running => {
                tracing::debug!(container = %spec.name, id = %record.id, "already running");
                return Ok(record);
            }
            Ok(record) => {
                tracing::info!(
                    container = %spec.name,
                    id = %record.id,
                    "removing stopped container before recreating it"
                );
                self.runtime.remove_container(&record.id).await?;
            }
            Err(ContainerError::NotFound(_)) => {
                tracing::debug!(container = %spec.name, "container does not exist");
            }
            Err(e) => return Err(e),
        }

        tracing::info!(container = %spec.name, image = %spec.image, "creating container");
        let id = self.runtime.create_container(spec).await?;
        self.runtime.start_container(&id).await?;

        self.runtime.inspect_container(id.as_str()).await
    }

    pub async fn inspect(&self, name_or_id: &str) -> Result<ContainerRecord, ContainerError> {
        self.runtime.inspect_container(name_or_id).await
    }

    /// Every container known to the runtime, stopped ones included.
    pub async fn list_all(&self) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.runtime.list_containers(&ContainerFilters::all()).await
    }

    pub async fn stop(&self, id: &ContainerId, timeout: Duration) -> Result<(), ContainerError> {
        self.runtime.stop_container(id, timeout).await
    }

    pub async fn remove(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.runtime.remove_container(id).await
    }
}
