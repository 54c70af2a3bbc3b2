// ABOUTME: Host layout: container names, images, and the files cutover reads and writes.
// ABOUTME: Defaults match the production host; a YAML file may override any field.

use crate::error::{Error, Result};
use crate::types::ReleaseTag;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    /// Image for the cache container.
    pub cache_image: String,
    /// Fixed name of the cache container.
    pub cache_name: String,
    /// Bind mount for the cache data directory.
    pub cache_bind: String,
    /// Link string giving release containers access to the cache.
    pub cache_link: String,

    /// Release image family; each release runs `<release_image>:<tag>`.
    pub release_image: String,
    /// Release containers are named `<release_prefix><tag>`.
    pub release_prefix: String,
    /// User the release container runs as.
    pub release_user: String,
    /// Port the release listens on inside its container.
    pub release_port: u16,
    /// Readiness endpoint path.
    pub health_path: String,

    /// Directory nginx includes server configs from.
    pub nginx_conf_dir: PathBuf,
    /// File name of the production virtual host inside `nginx_conf_dir`.
    pub production_conf_file: String,
    pub nginx_pid_file: PathBuf,

    /// Last promoted tag, plain text.
    pub tag_file: PathBuf,
    /// `KEY=VALUE` environment for release containers.
    pub env_file: PathBuf,
    /// Advisory lock held for the duration of a deploy.
    pub lock_file: PathBuf,

    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub probe_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            cache_image: "daaku/redis".to_string(),
            cache_name: "redis".to_string(),
            cache_bind: "/var/lib/redis:/data".to_string(),
            cache_link: "redis:redis".to_string(),
            release_image: "daaku/rell".to_string(),
            release_prefix: "rell-".to_string(),
            release_user: "15151".to_string(),
            release_port: 43600,
            health_path: "/info/".to_string(),
            nginx_conf_dir: PathBuf::from("/etc/nginx/server"),
            production_conf_file: "rell-prod.conf".to_string(),
            nginx_pid_file: PathBuf::from("/run/nginx.pid"),
            tag_file: PathBuf::from("/var/lib/rell/production-tag"),
            env_file: PathBuf::from("/etc/conf.d/rell"),
            lock_file: PathBuf::from("/var/lib/rell/deploy.lock"),
            probe_timeout: Duration::from_secs(60),
            probe_interval: Duration::from_millis(25),
            stop_timeout: Duration::from_secs(30),
        }
    }
}

impl Layout {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Container name for a release.
    pub fn release_container_name(&self, tag: &ReleaseTag) -> String {
        format!("{}{}", self.release_prefix, tag)
    }

    /// Image reference for a release.
    pub fn release_image_ref(&self, tag: &ReleaseTag) -> String {
        format!("{}:{}", self.release_image, tag)
    }

    /// Whether an image reference belongs to the release image family.
    pub fn is_release_image(&self, image: &str) -> bool {
        image
            .strip_prefix(self.release_image.as_str())
            .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Recover a tag from a container name by stripping the release prefix.
    pub fn tag_from_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.trim_start_matches('/')
            .strip_prefix(self.release_prefix.as_str())
            .filter(|tag| !tag.is_empty())
    }
}
