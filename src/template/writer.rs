use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::prompt::OverwritePrompt;

use super::operation::{Outcome, TemplateOperation};

/// Applies planned operations to the filesystem.
pub struct OperationWriter<'a> {
    context: RunContext,
    prompt: &'a dyn OverwritePrompt,
}

impl<'a> OperationWriter<'a> {
    pub fn new(context: RunContext, prompt: &'a dyn OverwritePrompt) -> Self {
        Self { context, prompt }
    }

    /// Applies one operation and reports how the entry ended up.
    ///
    /// Existing targets are replaced when `force` is set or the prompt agrees;
    /// otherwise the entry is skipped. A dry run never prompts and never
    /// touches the filesystem.
    pub fn apply(&self, operation: &TemplateOperation) -> Result<Outcome> {
        debug!("Handling file operation: {operation:?}");
        let dry_run = self.context.dry_run();

        if let TemplateOperation::CreateDirectory { target, mode, target_exists } = operation {
            info!("{}", operation.get_message(false, dry_run));
            if !dry_run && !target_exists {
                create_directory(target, *mode)?;
            }
            return Ok(Outcome::Copied);
        }

        let confirmed = self.confirm(operation)?;
        info!("{}", operation.get_message(confirmed, dry_run));
        if !confirmed {
            return Ok(Outcome::Skipped);
        }
        if dry_run {
            return Ok(operation.outcome());
        }

        self.execute(operation).inspect_err(|e| {
            debug!("Failed to {}: {e}", operation.error_context());
        })?;
        Ok(operation.outcome())
    }

    fn confirm(&self, operation: &TemplateOperation) -> Result<bool> {
        if !operation.target_exists() || self.context.force() || self.context.dry_run() {
            return Ok(true);
        }
        self.prompt.confirm_overwrite(operation.target_path())
    }

    fn execute(&self, operation: &TemplateOperation) -> Result<()> {
        let target = operation.target_path();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(Error::io_at(parent))?;
        }
        if operation.target_exists() {
            remove_existing(target)?;
        }

        match operation {
            TemplateOperation::Copy { source, target, mode, .. } => {
                fs::copy(source, target).map_err(Error::io_at(source))?;
                set_mode(target, *mode)
            }
            TemplateOperation::Write { target, content, mode, .. } => {
                fs::write(target, content).map_err(Error::io_at(target))?;
                set_mode(target, *mode)
            }
            TemplateOperation::Symlink { link, target, .. } => create_symlink(link, target),
            TemplateOperation::CreateDirectory { target, mode, .. } => {
                create_directory(target, *mode)
            }
        }
    }
}

fn create_directory(target: &Path, mode: Option<u32>) -> Result<()> {
    fs::create_dir_all(target).map_err(Error::io_at(target))?;
    set_mode(target, mode)
}

/// Removes a file or link sitting where the output goes. Directories are left
/// alone so replacing one fails loudly on the following write.
fn remove_existing(target: &Path) -> Result<()> {
    match fs::symlink_metadata(target) {
        Ok(metadata) if !metadata.is_dir() => {
            fs::remove_file(target).map_err(Error::io_at(target))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn set_mode(target: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(target, fs::Permissions::from_mode(mode))
            .map_err(Error::io_at(target)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn set_mode(_target: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link, target).map_err(Error::io_at(target))
}

#[cfg(not(unix))]
fn create_symlink(link: &Path, target: &Path) -> Result<()> {
    Err(Error::path(
        target,
        format!("cannot recreate the link to '{}' on this platform", link.display()),
    ))
}
