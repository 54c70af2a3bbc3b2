// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries what earlier steps established, so later steps cannot run early.

use crate::runtime::ContainerRecord;
use std::path::PathBuf;

/// Nothing done yet.
/// Available actions: `ensure_cache()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Cache container running.
/// Available actions: `ensure_release()`
#[derive(Debug, Clone)]
pub struct CacheReady {
    pub(crate) cache: ContainerRecord,
}

/// Release container running.
/// Available actions: `write_upstream()`
#[derive(Debug, Clone)]
pub struct ReleaseStarted {
    pub(crate) release: ContainerRecord,
}

/// Upstream config for the release written.
/// Available actions: `await_ready()`
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub(crate) release: ContainerRecord,
    pub(crate) upstream_conf: PathBuf,
}

/// Release answers its health endpoint.
/// Available actions: `promote()`, `reload()`
#[derive(Debug, Clone)]
pub struct Ready {
    pub(crate) release: ContainerRecord,
}

/// Production config and tag file point at the release; nginx not yet told.
/// Available actions: `reload()`
#[derive(Debug, Clone)]
pub struct Promoted {
    pub(crate) release: ContainerRecord,
}

/// Reloaded without promotion. Terminal.
///
/// Cleanup is only reachable through promotion:
///
/// ```compile_fail
/// use cutover::deploy::{Deployment, Staged, CleanupSweeper};
/// use cutover::runtime::ContainerOps;
///
/// async fn sweep<R: ContainerOps>(d: Deployment<Staged>, sweeper: &CleanupSweeper<'_, R>) {
///     d.cleanup(sweeper).await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Staged {
    pub(crate) release: ContainerRecord,
}

/// Promoted and reloaded: the release is serving production.
/// Available actions: `cleanup()`
#[derive(Debug, Clone)]
pub struct Live {
    pub(crate) release: ContainerRecord,
}

/// Superseded releases removed. Terminal.
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) release: ContainerRecord,
    pub(crate) retired: Vec<String>,
}

/// States in which the release container is known.
pub trait HasRelease {
    fn release(&self) -> &ContainerRecord;
}

macro_rules! has_release {
    ($($state:ty),* $(,)?) => {
        $(
            impl HasRelease for $state {
                fn release(&self) -> &ContainerRecord {
                    &self.release
                }
            }
        )*
    };
}

has_release!(ReleaseStarted, Synthesized, Ready, Promoted, Staged, Live, Completed);
