use std::fs::{self, Metadata};
use std::path::Path;

use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::renderer::TemplateRenderer;
use crate::tome::Tome;

use super::operation::TemplateOperation;

/// Plans the operation for each entry of one tome's subtree.
pub struct TemplateProcessor<'a> {
    /// Dependencies
    engine: &'a dyn TemplateRenderer,
    tome: &'a Tome,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new(engine: &'a dyn TemplateRenderer, tome: &'a Tome) -> Self {
        Self { engine, tome }
    }

    /// Processes an entry and determines the appropriate operation.
    ///
    /// Symlinks are recreated whatever their classification; files are copied
    /// or rendered according to the tome's copy/temp patterns.
    pub fn process(&self, entry: &Path) -> Result<TemplateOperation> {
        let metadata = fs::symlink_metadata(entry).map_err(Error::io_at(entry))?;
        let target = self.tome.output_path(self.engine, entry)?;
        let file_type = metadata.file_type();

        if file_type.is_dir() {
            return Ok(TemplateOperation::CreateDirectory {
                target_exists: target.is_dir(),
                mode: self.tome.mode().map(searchable).or_else(|| permission_bits(&metadata)),
                target,
            });
        }

        // a dangling link in the output still counts as existing
        let target_exists = fs::symlink_metadata(&target).is_ok();

        if file_type.is_symlink() {
            let link = fs::read_link(entry).map_err(Error::io_at(entry))?;
            return Ok(TemplateOperation::Symlink { link, target, target_exists });
        }

        let mode = self.mode_for(&metadata);
        if self.tome.should_copy(entry) {
            return Ok(TemplateOperation::Copy {
                source: entry.to_path_buf(),
                target,
                mode,
                target_exists,
            });
        }

        let template = fs::read_to_string(entry).map_err(Error::io_at(entry))?;
        let content = self.tome.template(self.engine, &template, entry.to_str_checked()?)?;
        Ok(TemplateOperation::Write { target, content, mode, target_exists })
    }

    /// The tome's mode, falling back to the entry's own permission bits.
    fn mode_for(&self, metadata: &Metadata) -> Option<u32> {
        self.tome.mode().or_else(|| permission_bits(metadata))
    }
}

/// Adds the search bit wherever the read bit is set, so a file mode such as
/// `644` still yields traversable directories.
fn searchable(mode: u32) -> u32 {
    mode | ((mode & 0o444) >> 2)
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &Metadata) -> Option<u32> {
    None
}
