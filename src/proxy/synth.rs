// ABOUTME: Writes per-release and production nginx configs into the proxy's config directory.
// ABOUTME: Renders fully in memory first; a failed write removes the partial file.

use super::error::{CreateSnafu, NoAddressSnafu, ProxyError, RemoveSnafu, RenderSnafu};
use super::templates::{CIPHERS, ProductionConf, UpstreamConf, render_file};
use crate::config::Settings;
use crate::runtime::ContainerRecord;
use crate::types::ReleaseTag;
use snafu::{OptionExt, ResultExt};
use std::fs::{self, File};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Renders and writes nginx config files.
#[derive(Debug, Clone)]
pub struct ConfigSynthesizer {
    conf_dir: PathBuf,
    production_file: String,
    release_prefix: String,
    release_port: u16,
    server_suffix: String,
    cert_file: String,
    key_file: String,
}

impl ConfigSynthesizer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            conf_dir: settings.layout.nginx_conf_dir.clone(),
            production_file: settings.layout.production_conf_file.clone(),
            release_prefix: settings.layout.release_prefix.clone(),
            release_port: settings.layout.release_port,
            server_suffix: settings.server_suffix.clone(),
            cert_file: settings.cert_file.clone(),
            key_file: settings.key_file.clone(),
        }
    }

    /// `<conf_dir>/<container>.conf`
    pub fn upstream_path(&self, container_name: &str) -> PathBuf {
        self.conf_dir.join(format!("{container_name}.conf"))
    }

    pub fn production_path(&self) -> PathBuf {
        self.conf_dir.join(&self.production_file)
    }

    /// Server name a release is reachable at before promotion.
    pub fn server_name(&self, tag: &ReleaseTag) -> String {
        format!("{}.{}", tag, self.server_suffix)
    }

    pub fn render_upstream(
        &self,
        tag: &ReleaseTag,
        backend_name: &str,
        address: SocketAddr,
    ) -> Result<String, ProxyError> {
        let server_name = self.server_name(tag);
        let conf = UpstreamConf {
            backend_name,
            server_name: &server_name,
            address,
            cert_file: &self.cert_file,
            key_file: &self.key_file,
            ciphers: CIPHERS,
        };
        render_file(&conf).context(RenderSnafu {
            template: "upstream",
        })
    }

    pub fn render_production(&self, tag: &ReleaseTag) -> Result<String, ProxyError> {
        let backend_name = format!("{}{}", self.release_prefix, tag);
        let conf = ProductionConf {
            server_suffix: &self.server_suffix,
            backend_name: &backend_name,
            cert_file: &self.cert_file,
            key_file: &self.key_file,
            ciphers: CIPHERS,
        };
        render_file(&conf).context(RenderSnafu {
            template: "production",
        })
    }

    /// Where nginx should send traffic for a release container.
    pub fn release_address(&self, release: &ContainerRecord) -> Result<SocketAddr, ProxyError> {
        let ip = release.ip_address.context(NoAddressSnafu {
            container: release.name.as_str(),
        })?;
        Ok(SocketAddr::new(ip, self.release_port))
    }

    /// Write the upstream config for a release container. The backend is
    /// named after the container and points at its internal address.
    pub fn write_upstream_config(
        &self,
        tag: &ReleaseTag,
        release: &ContainerRecord,
    ) -> Result<PathBuf, ProxyError> {
        let address = self.release_address(release)?;
        let contents = self.render_upstream(tag, &release.name, address)?;
        let path = self.upstream_path(&release.name);
        write_config(&path, &contents)?;
        tracing::info!(path = %path.display(), %address, "wrote upstream config");
        Ok(path)
    }

    /// Point the production virtual host at the release for `tag`.
    pub fn write_production_config(&self, tag: &ReleaseTag) -> Result<PathBuf, ProxyError> {
        let contents = self.render_production(tag)?;
        let path = self.production_path();
        write_config(&path, &contents)?;
        tracing::info!(path = %path.display(), %tag, "wrote production config");
        Ok(path)
    }

    /// Delete a release's upstream config. Returns `false` if there was none.
    pub fn remove_upstream_config(&self, container_name: &str) -> Result<bool, ProxyError> {
        let path = self.upstream_path(container_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(source).context(RemoveSnafu { path }),
        }
    }
}

/// Overwrite `path` with `contents`, leaving no file behind on failure.
fn write_config(path: &Path, contents: &str) -> Result<(), ProxyError> {
    write_config_with(path, |file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    })
}

fn write_config_with<F>(path: &Path, write: F) -> Result<(), ProxyError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = File::create(path).context(CreateSnafu { path })?;

    if let Err(source) = write(&mut file) {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "failed to remove partial config: {}", e);
        }
        return Err(ProxyError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
