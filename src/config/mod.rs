// ABOUTME: Process configuration for a cutover run.
// ABOUTME: Environment inputs with defaults plus the host layout loaded from YAML.

mod env_file;
mod layout;

pub use env_file::{parse_env_file, read_env_file};
pub use layout::Layout;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional layout file.
pub const CONFIG_ENV: &str = "CUTOVER_CONFIG";

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_SERVER_SUFFIX: &str = "minetti.fbrell.com";
pub const DEFAULT_CERT_FILE: &str = "/etc/nginx/cert/star-minetti-cert.pem";
pub const DEFAULT_KEY_FILE: &str = "/etc/nginx/cert/star-minetti-key.pem";
pub const DEFAULT_TAG: &str = "latest";

/// Everything a deploy needs to know about its host.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Container runtime endpoint (`DOCKER_HOST`).
    pub docker_host: String,
    /// Public domain suffix (`SERVER_SUFFIX`).
    pub server_suffix: String,
    /// TLS certificate path written into nginx configs (`CERT_FILE`).
    pub cert_file: String,
    /// TLS key path written into nginx configs (`KEY_FILE`).
    pub key_file: String,
    /// Tag to deploy when none is given on the command line (`TAG`).
    pub tag: String,
    /// Names, images and paths on the host.
    pub layout: Layout,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None, Layout::default())
    }
}

impl Settings {
    /// Build settings from an environment lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, layout: Layout) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            docker_host: get("DOCKER_HOST", DEFAULT_DOCKER_HOST),
            server_suffix: get("SERVER_SUFFIX", DEFAULT_SERVER_SUFFIX),
            cert_file: get("CERT_FILE", DEFAULT_CERT_FILE),
            key_file: get("KEY_FILE", DEFAULT_KEY_FILE),
            tag: get("TAG", DEFAULT_TAG),
            layout,
        }
    }

    /// Load settings from the process environment.
    ///
    /// The layout comes from `config_path` if given, else from the file named
    /// by `CUTOVER_CONFIG`, else the built-in defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();

        let config_path = config_path.map(Path::to_path_buf).or_else(|| {
            lookup(CONFIG_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });

        let layout = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path));
                }
                tracing::debug!(path = %path.display(), "loading layout");
                Layout::load(&path)?
            }
            None => Layout::default(),
        };

        Ok(Self::from_lookup(lookup, layout))
    }
}
