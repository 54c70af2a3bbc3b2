// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::collections::HashMap;

use crate::config::read_env_file;
use crate::probe::{Probe, wait_until_ready};
use crate::proxy::{ConfigSynthesizer, Reloader};
use crate::runtime::{
    ContainerManager, ContainerOps, ContainerSpec, ROLE_CACHE, ROLE_LABEL, ROLE_RELEASE, TAG_LABEL,
};

use super::Deployment;
use super::cleanup::CleanupSweeper;
use super::cutover::CutoverController;
use super::error::DeployError;
use super::state::{
    CacheReady, Completed, Initialized, Live, Promoted, Ready, ReleaseStarted, Staged, Synthesized,
};

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            settings: self.settings,
            tag: self.tag,
            state,
        }
    }

    /// Container spec for the shared cache.
    pub fn cache_spec(&self) -> ContainerSpec {
        let layout = &self.settings.layout;
        ContainerSpec {
            name: layout.cache_name.clone(),
            image: layout.cache_image.clone(),
            labels: HashMap::from([(ROLE_LABEL.to_string(), ROLE_CACHE.to_string())]),
            binds: vec![layout.cache_bind.clone()],
            ..Default::default()
        }
    }

    /// Container spec for the release, with `env` injected verbatim.
    pub fn release_spec(&self, env: Vec<String>) -> ContainerSpec {
        let layout = &self.settings.layout;
        ContainerSpec {
            name: layout.release_container_name(&self.tag),
            image: layout.release_image_ref(&self.tag),
            user: Some(layout.release_user.clone()).filter(|u| !u.is_empty()),
            env,
            labels: HashMap::from([
                (ROLE_LABEL.to_string(), ROLE_RELEASE.to_string()),
                (TAG_LABEL.to_string(), self.tag.to_string()),
            ]),
            binds: Vec::new(),
            links: vec![layout.cache_link.clone()],
        }
    }
}

impl Deployment<Initialized> {
    /// Make sure the cache container is running.
    pub async fn ensure_cache<R: ContainerOps>(
        self,
        manager: &ContainerManager<R>,
    ) -> Result<Deployment<CacheReady>, DeployError> {
        let spec = self.cache_spec();
        let cache = manager
            .ensure_running(&spec)
            .await
            .map_err(|source| DeployError::EnsureRunning {
                container: spec.name.clone(),
                source,
            })?;

        tracing::info!(container = %cache.name, id = %cache.id, "cache running");
        Ok(self.transition(CacheReady { cache }))
    }
}

impl Deployment<CacheReady> {
    /// Make sure the release container for this tag is running.
    ///
    /// The env file is read on every call, even when an existing container
    /// ends up being reused, so a broken env file always fails the deploy.
    pub async fn ensure_release<R: ContainerOps>(
        self,
        manager: &ContainerManager<R>,
    ) -> Result<Deployment<ReleaseStarted>, DeployError> {
        let env_path = &self.settings.layout.env_file;
        let env = read_env_file(env_path).map_err(|source| DeployError::EnvFile {
            path: env_path.clone(),
            source,
        })?;

        let spec = self.release_spec(env);
        let release = manager
            .ensure_running(&spec)
            .await
            .map_err(|source| DeployError::EnsureRunning {
                container: spec.name.clone(),
                source,
            })?;

        tracing::info!(container = %release.name, id = %release.id, "release running");
        Ok(self.transition(ReleaseStarted { release }))
    }
}

impl Deployment<ReleaseStarted> {
    /// Write the per-release upstream config.
    pub fn write_upstream(
        self,
        synth: &ConfigSynthesizer,
    ) -> Result<Deployment<Synthesized>, DeployError> {
        let upstream_conf = synth.write_upstream_config(&self.tag, &self.state.release)?;
        let release = self.state.release.clone();
        Ok(self.transition(Synthesized {
            release,
            upstream_conf,
        }))
    }
}

impl Deployment<Synthesized> {
    pub fn upstream_conf(&self) -> &std::path::Path {
        &self.state.upstream_conf
    }

    /// Poll the release's health endpoint until it answers.
    pub async fn await_ready<P: Probe + ?Sized>(
        self,
        probe: &P,
        synth: &ConfigSynthesizer,
    ) -> Result<Deployment<Ready>, DeployError> {
        let address = synth.release_address(&self.state.release)?;
        let layout = &self.settings.layout;

        wait_until_ready(probe, address, layout.probe_timeout, layout.probe_interval)
            .await
            .map_err(|source| DeployError::NotReady {
                container: self.state.release.name.clone(),
                source,
            })?;

        let release = self.state.release.clone();
        Ok(self.transition(Ready { release }))
    }
}

impl Deployment<Ready> {
    /// Point production at this release and record its tag.
    pub fn promote(
        self,
        cutover: &CutoverController<'_>,
    ) -> Result<Deployment<Promoted>, DeployError> {
        cutover.promote(&self.tag)?;
        let release = self.state.release.clone();
        Ok(self.transition(Promoted { release }))
    }

    /// Reload nginx so the release is reachable under its own name only.
    pub async fn reload<H: Reloader + ?Sized>(
        self,
        reloader: &H,
    ) -> Result<Deployment<Staged>, DeployError> {
        reloader.reload().await?;
        tracing::info!(tag = %self.tag, "release staged without promotion");
        let release = self.state.release.clone();
        Ok(self.transition(Staged { release }))
    }
}

impl Deployment<Promoted> {
    /// Reload nginx so production traffic moves to the release.
    pub async fn reload<H: Reloader + ?Sized>(
        self,
        reloader: &H,
    ) -> Result<Deployment<Live>, DeployError> {
        reloader.reload().await?;
        tracing::info!(tag = %self.tag, "release live");
        let release = self.state.release.clone();
        Ok(self.transition(Live { release }))
    }
}

impl Deployment<Live> {
    /// Retire every release other than this one.
    pub async fn cleanup<R: ContainerOps>(
        self,
        sweeper: &CleanupSweeper<'_, R>,
    ) -> Result<Deployment<Completed>, DeployError> {
        let report = sweeper.retire_except(&self.tag).await?;
        let release = self.state.release.clone();
        Ok(self.transition(Completed {
            release,
            retired: report.retired,
        }))
    }
}
