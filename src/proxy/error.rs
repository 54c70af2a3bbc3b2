// ABOUTME: Proxy error types with SNAFU pattern.
// ABOUTME: Every file-system failure carries the path it concerns.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProxyError {
    #[snafu(display("failed to render {template} config: {source}"))]
    Render {
        template: &'static str,
        source: askama::Error,
    },

    #[snafu(display("container {container} has no internal address"))]
    NoAddress { container: String },

    #[snafu(display("failed to create {}: {source}", path.display()))]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to remove {}: {source}", path.display()))]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to read pid file {}: {source}", path.display()))]
    ReadPid {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid pid {contents:?} in {}", path.display()))]
    ParsePid { path: PathBuf, contents: String },

    #[snafu(display("failed to signal proxy process {pid}: {source}"))]
    Signal { pid: i32, source: std::io::Error },
}

impl ProxyError {
    /// Whether the failure happened while signalling the proxy rather than
    /// while touching its config files.
    pub fn is_reload(&self) -> bool {
        matches!(
            self,
            ProxyError::ReadPid { .. } | ProxyError::ParsePid { .. } | ProxyError::Signal { .. }
        )
    }
}
