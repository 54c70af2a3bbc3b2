// ABOUTME: Application-wide error types for cutover.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::deploy::DeployError;
use crate::proxy::ProxyError;
use crate::runtime::{ContainerError, RuntimeError};
use crate::types::ReleaseTagError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid release tag: {0}")]
    InvalidTag(#[from] ReleaseTagError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("container runtime error: {0}")]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
