// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Release tags and container IDs used throughout the deploy sequence.

mod id;
mod release_tag;

pub use id::ContainerId;
pub use release_tag::{ReleaseTag, ReleaseTagError};
