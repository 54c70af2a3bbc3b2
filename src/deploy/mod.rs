// ABOUTME: Deployment orchestration with type state pattern.
// ABOUTME: Ensures deploy steps run in order: cache, release, upstream, readiness, promotion, reload, cleanup.

mod cleanup;
mod cutover;
mod deployment;
mod error;
mod lock;
mod orchestrator;
mod state;
mod transitions;

pub use cleanup::{CleanupReport, CleanupSweeper, is_release_container, release_tag_of};
pub use cutover::{CutoverController, read_applied_tag};
pub use deployment::Deployment;
pub use error::{CleanupErrors, DeployError, DeployErrorKind};
pub use lock::{DeployLock, LockInfo};
pub use orchestrator::{DeployOutcome, Orchestrator};
pub use state::{
    CacheReady, Completed, HasRelease, Initialized, Live, Promoted, Ready, ReleaseStarted, Staged,
    Synthesized,
};
