// ABOUTME: Validated release identifier.
// ABOUTME: Tags name containers, config files and virtual hosts, so they must be file and DNS safe.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest tag that still fits in a single DNS label.
const MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReleaseTagError {
    #[error("release tag cannot be empty")]
    Empty,

    #[error("release tag exceeds maximum length of 63 characters")]
    TooLong,

    #[error("release tag cannot start with '{0}'")]
    BadStart(char),

    #[error("invalid character in release tag: '{0}'")]
    InvalidChar(char),
}

/// Identifier of a deployable release, e.g. `v42`.
///
/// The tag becomes part of the container name (`rell-v42`), of the upstream
/// config file name (`rell-v42.conf`) and of the per-release server name
/// (`v42.<suffix>`). Only image-tag characters are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    pub fn new(value: &str) -> Result<Self, ReleaseTagError> {
        let first = value.chars().next().ok_or(ReleaseTagError::Empty)?;

        if value.len() > MAX_LEN {
            return Err(ReleaseTagError::TooLong);
        }

        if first == '-' || first == '.' {
            return Err(ReleaseTagError::BadStart(first));
        }

        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ReleaseTagError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ReleaseTag {
    type Err = ReleaseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ReleaseTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
