// ABOUTME: Container runtime access for the deploy sequence.
// ABOUTME: ContainerOps trait, its bollard implementation, and the idempotent ContainerManager.

mod bollard;
mod container;
mod error;
mod manager;

pub use self::bollard::BollardRuntime;
pub use container::{
    ContainerError, ContainerFilters, ContainerOps, ContainerRecord, ContainerSpec,
    ContainerSummary,
};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use manager::ContainerManager;

/// Label marking containers created by cutover.
pub const ROLE_LABEL: &str = "cutover.role";
/// Label carrying a release container's tag.
pub const TAG_LABEL: &str = "cutover.tag";
/// `ROLE_LABEL` value for release containers.
pub const ROLE_RELEASE: &str = "release";
/// `ROLE_LABEL` value for the cache container.
pub const ROLE_CACHE: &str = "cache";
