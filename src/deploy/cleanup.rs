// ABOUTME: Retires superseded release containers after a promotion.
// ABOUTME: Removes their upstream configs and containers, collecting failures instead of stopping.

use crate::config::Layout;
use crate::proxy::ConfigSynthesizer;
use crate::runtime::{
    ContainerManager, ContainerOps, ContainerSummary, ROLE_LABEL, ROLE_RELEASE, TAG_LABEL,
};
use crate::types::ReleaseTag;

use super::error::DeployError;

/// What a cleanup sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Containers removed.
    pub retired: Vec<String>,
    /// Release containers left in place because they carry the current tag.
    pub kept: Vec<String>,
}

/// True if `summary` is one of our release containers: either labelled as
/// such or created from the release image family.
pub fn is_release_container(summary: &ContainerSummary, layout: &Layout) -> bool {
    summary.labels.get(ROLE_LABEL).map(String::as_str) == Some(ROLE_RELEASE)
        || layout.is_release_image(&summary.image)
}

/// The release tag a container was started for.
///
/// The tag label wins; containers created without labels fall back to the
/// tag embedded in their name.
pub fn release_tag_of(summary: &ContainerSummary, layout: &Layout) -> Option<String> {
    if !is_release_container(summary, layout) {
        return None;
    }
    summary
        .labels
        .get(TAG_LABEL)
        .filter(|t| !t.is_empty())
        .cloned()
        .or_else(|| layout.tag_from_name(&summary.name).map(str::to_string))
}

pub struct CleanupSweeper<'a, R> {
    manager: &'a ContainerManager<R>,
    synth: &'a ConfigSynthesizer,
    layout: &'a Layout,
}

impl<'a, R: ContainerOps> CleanupSweeper<'a, R> {
    pub fn new(
        manager: &'a ContainerManager<R>,
        synth: &'a ConfigSynthesizer,
        layout: &'a Layout,
    ) -> Self {
        Self {
            manager,
            synth,
            layout,
        }
    }

    /// Remove every release container whose tag is not `current`, along with
    /// its upstream config.
    ///
    /// Stop errors are logged and ignored. Config and removal failures are
    /// collected and returned together once every candidate has been tried.
    pub async fn retire_except(&self, current: &ReleaseTag) -> Result<CleanupReport, DeployError> {
        let containers = self.manager.list_all().await.map_err(DeployError::List)?;

        let mut report = CleanupReport::default();
        let mut failures = Vec::new();

        for container in containers {
            if !is_release_container(&container, self.layout) {
                continue;
            }
            let Some(tag) = release_tag_of(&container, self.layout) else {
                tracing::warn!(
                    container = %container.name,
                    id = %container.id,
                    "release container without a tag, skipping"
                );
                continue;
            };
            if tag == current.as_str() {
                report.kept.push(container.name);
                continue;
            }

            match self.synth.remove_upstream_config(&container.name) {
                Ok(true) => tracing::debug!(container = %container.name, "removed upstream config"),
                Ok(false) => {
                    tracing::debug!(container = %container.name, "no upstream config to remove")
                }
                Err(e) => failures.push(DeployError::from(e)),
            }

            if let Err(e) = self
                .manager
                .stop(&container.id, self.layout.stop_timeout)
                .await
            {
                tracing::debug!(container = %container.name, "ignoring stop error: {}", e);
            }

            match self.manager.remove(&container.id).await {
                Ok(()) => {
                    tracing::info!(container = %container.name, %tag, "retired release");
                    report.retired.push(container.name);
                }
                Err(source) => {
                    tracing::warn!(container = %container.name, "failed to remove: {}", source);
                    failures.push(DeployError::Remove {
                        container: container.name,
                        source,
                    });
                }
            }
        }

        DeployError::from_failures(failures)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContainerId;
    use std::collections::HashMap;

    fn summary(name: &str, image: &str, labels: &[(&str, &str)]) -> ContainerSummary {
        ContainerSummary {
            id: ContainerId::new(format!("id-{}", name)),
            name: name.to_string(),
            image: image.to_string(),
            state: "running".to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn tag_label_wins_over_name() {
        let layout = Layout::default();
        let c = summary(
            "rell-old",
            "something/else",
            &[(ROLE_LABEL, ROLE_RELEASE), (TAG_LABEL, "v9")],
        );
        assert_eq!(release_tag_of(&c, &layout).as_deref(), Some("v9"));
    }

    #[test]
    fn unlabelled_release_image_uses_name() {
        let layout = Layout::default();
        let c = summary("rell-v3", "daaku/rell:v3", &[]);
        assert_eq!(release_tag_of(&c, &layout).as_deref(), Some("v3"));
    }

    #[test]
    fn foreign_containers_are_ignored() {
        let layout = Layout::default();
        assert_eq!(release_tag_of(&summary("redis", "daaku/redis", &[]), &layout), None);
        assert_eq!(
            release_tag_of(&summary("rell-v3", "daaku/rellish:v3", &[]), &layout),
            None
        );
    }

    #[test]
    fn release_without_derivable_tag_yields_none() {
        let layout = Layout::default();
        let c = summary("webapp", "daaku/rell:v1", &[]);
        assert!(is_release_container(&c, &layout));
        assert_eq!(release_tag_of(&c, &layout), None);
    }
}
