// ABOUTME: Promotion of a ready release to production.
// ABOUTME: Rewrites the production virtual host and records the applied tag.

use std::fs;
use std::io;
use std::path::Path;

use crate::proxy::ConfigSynthesizer;
use crate::types::ReleaseTag;

use super::error::DeployError;

/// Switches the production virtual host to a release.
#[derive(Debug, Clone, Copy)]
pub struct CutoverController<'a> {
    synth: &'a ConfigSynthesizer,
    tag_file: &'a Path,
}

impl<'a> CutoverController<'a> {
    pub fn new(synth: &'a ConfigSynthesizer, tag_file: &'a Path) -> Self {
        Self { synth, tag_file }
    }

    /// Write the production config for `tag`, then persist `tag` as the
    /// applied tag. The tag file is only touched once the config is in place.
    pub fn promote(&self, tag: &ReleaseTag) -> Result<(), DeployError> {
        self.synth.write_production_config(tag)?;
        write_tag_file(self.tag_file, tag).map_err(|source| DeployError::TagFile {
            path: self.tag_file.to_path_buf(),
            source,
        })?;
        tracing::info!(%tag, tag_file = %self.tag_file.display(), "promoted");
        Ok(())
    }
}

fn write_tag_file(path: &Path, tag: &ReleaseTag) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, tag.as_ref())
}

/// The tag recorded by the last promotion, if any.
pub fn read_applied_tag(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let tag = contents.trim();
            Ok((!tag.is_empty()).then(|| tag.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
