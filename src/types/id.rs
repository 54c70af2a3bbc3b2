// ABOUTME: Opaque container identifier returned by the runtime.
// ABOUTME: Keeps runtime IDs distinct from container names at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime-assigned container ID.
///
/// Names and IDs are both accepted by the runtime API, but only IDs are
/// stable across a remove/create cycle, so the two are kept apart.
#[must_use = "IDs reference resources and should not be ignored"]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
