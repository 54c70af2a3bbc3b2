// ABOUTME: Drives one deploy through every state transition in order.
// ABOUTME: Owns the runtime, probe and reloader so commands and tests can swap them.

use crate::config::Settings;
use crate::probe::Probe;
use crate::proxy::{ConfigSynthesizer, Reloader};
use crate::runtime::{ContainerManager, ContainerOps};
use crate::types::{ContainerId, ReleaseTag};

use super::Deployment;
use super::cleanup::CleanupSweeper;
use super::cutover::CutoverController;
use super::error::DeployError;

/// Summary of a finished deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub tag: ReleaseTag,
    /// Name of the release container.
    pub container: String,
    pub container_id: ContainerId,
    /// Whether production now points at this release.
    pub promoted: bool,
    /// Superseded containers removed after promotion.
    pub retired: Vec<String>,
}

pub struct Orchestrator<R, P, H> {
    settings: Settings,
    manager: ContainerManager<R>,
    synth: ConfigSynthesizer,
    probe: P,
    reloader: H,
}

impl<R, P, H> Orchestrator<R, P, H>
where
    R: ContainerOps,
    P: Probe,
    H: Reloader,
{
    pub fn new(settings: Settings, runtime: R, probe: P, reloader: H) -> Self {
        let synth = ConfigSynthesizer::new(&settings);
        Self {
            settings,
            manager: ContainerManager::new(runtime),
            synth,
            probe,
            reloader,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runtime(&self) -> &R {
        self.manager.runtime()
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn reloader(&self) -> &H {
        &self.reloader
    }

    /// Deploy `tag`.
    ///
    /// The release is started, given an upstream config, and probed. With
    /// `promote` set, production is switched to it, nginx reloaded, and every
    /// other release retired. Without it, nginx is reloaded so the release is
    /// reachable under its own name and nothing else changes.
    ///
    /// Any failure before the reload aborts the deploy with production
    /// untouched.
    #[tracing::instrument(skip_all, fields(tag = %tag, promote = promote))]
    pub async fn deploy_tag(
        &self,
        tag: &ReleaseTag,
        promote: bool,
    ) -> Result<DeployOutcome, DeployError> {
        let deployment = Deployment::new(self.settings.clone(), tag.clone())
            .ensure_cache(&self.manager)
            .await?
            .ensure_release(&self.manager)
            .await?
            .write_upstream(&self.synth)?
            .await_ready(&self.probe, &self.synth)
            .await?;

        if !promote {
            let staged = deployment.reload(&self.reloader).await?;
            return Ok(DeployOutcome {
                tag: tag.clone(),
                container: staged.release().name.clone(),
                container_id: staged.release_id().clone(),
                promoted: false,
                retired: Vec::new(),
            });
        }

        let cutover = CutoverController::new(&self.synth, &self.settings.layout.tag_file);
        let sweeper = CleanupSweeper::new(&self.manager, &self.synth, &self.settings.layout);

        let completed = deployment
            .promote(&cutover)?
            .reload(&self.reloader)
            .await?
            .cleanup(&sweeper)
            .await?;

        Ok(DeployOutcome {
            tag: tag.clone(),
            container: completed.release().name.clone(),
            container_id: completed.release_id().clone(),
            promoted: true,
            retired: completed.retired().to_vec(),
        })
    }
}
