//! Overwrite confirmation.

use std::path::Path;

use dialoguer::Confirm;

use crate::error::Result;

/// Decides whether an existing output may be replaced.
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, target: &Path) -> Result<bool>;
}

/// Asks on the terminal, defaulting to "no".
pub struct DialoguerPrompt;

impl OverwritePrompt for DialoguerPrompt {
    fn confirm_overwrite(&self, target: &Path) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(format!("'{}' already exists. Overwrite?", target.display()))
            .default(false)
            .interact()?)
    }
}

/// Answers every question the same way. Used for non-interactive runs.
pub struct FixedAnswer(pub bool);

impl OverwritePrompt for FixedAnswer {
    fn confirm_overwrite(&self, _target: &Path) -> Result<bool> {
        Ok(self.0)
    }
}
