// ABOUTME: Generic deployment struct parameterized by state.
// ABOUTME: Holds the tag being deployed and the settings every step reads.

use crate::config::Settings;
use crate::runtime::ContainerRecord;
use crate::types::{ContainerId, ReleaseTag};

use super::state::{CacheReady, Completed, HasRelease, Initialized};

/// A deployment in progress, parameterized by its current state.
///
/// Transitions consume the deployment and return it in the next state, so
/// the step order is checked by the compiler. Promoting a release that was
/// never probed does not compile:
///
/// ```compile_fail
/// use cutover::deploy::{CutoverController, Deployment, Synthesized};
///
/// fn skip_readiness(d: Deployment<Synthesized>, cutover: &CutoverController<'_>) {
///     let _ = d.promote(cutover);
/// }
/// ```
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) settings: Settings,
    pub(crate) tag: ReleaseTag,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    pub fn new(settings: Settings, tag: ReleaseTag) -> Self {
        Deployment {
            settings,
            tag,
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn tag(&self) -> &ReleaseTag {
        &self.tag
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Name of the release container for this deployment's tag.
    pub fn container_name(&self) -> String {
        self.settings.layout.release_container_name(&self.tag)
    }
}

impl Deployment<CacheReady> {
    pub fn cache(&self) -> &ContainerRecord {
        &self.state.cache
    }
}

impl<S: HasRelease> Deployment<S> {
    pub fn release(&self) -> &ContainerRecord {
        self.state.release()
    }

    pub fn release_id(&self) -> &ContainerId {
        &self.state.release().id
    }
}

impl Deployment<Completed> {
    /// Containers removed by cleanup.
    pub fn retired(&self) -> &[String] {
        &self.state.retired
    }
}
