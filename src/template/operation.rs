use std::path::{Path, PathBuf};

/// One planned filesystem change.
///
/// `mode` holds the permission bits the output ends up with: the tome's mode
/// when it sets one, otherwise the input's own bits.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateOperation {
    CreateDirectory { target: PathBuf, mode: Option<u32>, target_exists: bool },
    Copy { source: PathBuf, target: PathBuf, mode: Option<u32>, target_exists: bool },
    Write { target: PathBuf, content: String, mode: Option<u32>, target_exists: bool },
    /// `link` is the unresolved link text, recreated as is.
    Symlink { link: PathBuf, target: PathBuf, target_exists: bool },
}

/// How an entry ended up. Failures are reported as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Copied verbatim; directories and symlinks count as copied
    Copied,
    Rendered,
    /// The target existed and replacing it was declined
    Skipped,
}

impl TemplateOperation {
    /// Returns the target path for this operation, used for error context.
    pub fn target_path(&self) -> &Path {
        match self {
            TemplateOperation::CreateDirectory { target, .. }
            | TemplateOperation::Copy { target, .. }
            | TemplateOperation::Write { target, .. }
            | TemplateOperation::Symlink { target, .. } => target,
        }
    }

    pub fn target_exists(&self) -> bool {
        match self {
            TemplateOperation::CreateDirectory { target_exists, .. }
            | TemplateOperation::Copy { target_exists, .. }
            | TemplateOperation::Write { target_exists, .. }
            | TemplateOperation::Symlink { target_exists, .. } => *target_exists,
        }
    }

    /// The outcome when the operation goes ahead.
    pub fn outcome(&self) -> Outcome {
        match self {
            TemplateOperation::Write { .. } => Outcome::Rendered,
            _ => Outcome::Copied,
        }
    }

    /// Returns a brief description of this operation for error messages.
    pub fn error_context(&self) -> String {
        match self {
            TemplateOperation::CreateDirectory { target, .. } => {
                format!("create directory '{}'", target.display())
            }
            TemplateOperation::Copy { source, target, .. } => {
                format!("copy '{}' -> '{}'", source.display(), target.display())
            }
            TemplateOperation::Write { target, .. } => {
                format!("write '{}'", target.display())
            }
            TemplateOperation::Symlink { link, target, .. } => {
                format!("link '{}' -> '{}'", target.display(), link.display())
            }
        }
    }

    /// Gets a message describing the operation and its status.
    ///
    /// # Arguments
    /// * `user_confirmed_overwrite` - Whether replacing an existing target was confirmed
    /// * `dry_run` - Whether this is a dry run (no actual file operations)
    pub fn get_message(&self, user_confirmed_overwrite: bool, dry_run: bool) -> String {
        let prefix = if dry_run { "[DRY RUN] " } else { "" };

        let (action, subject) = match self {
            TemplateOperation::CreateDirectory { target, target_exists, .. } => {
                return if *target_exists {
                    format!(
                        "{prefix}Skipping directory creation '{}' (already exists)",
                        target.display()
                    )
                } else {
                    format!("{prefix}Creating directory '{}'", target.display())
                };
            }
            TemplateOperation::Copy { source, target, .. } => (
                "Copying",
                format!("'{}' to '{}'", source.display(), target.display()),
            ),
            TemplateOperation::Write { target, .. } => {
                ("Writing", format!("to '{}'", target.display()))
            }
            TemplateOperation::Symlink { link, target, .. } => (
                "Linking",
                format!("'{}' to '{}'", target.display(), link.display()),
            ),
        };

        match (self.target_exists(), user_confirmed_overwrite) {
            (false, _) => format!("{prefix}{action} {subject}"),
            (true, true) => format!("{prefix}{action} {subject} (overwriting existing file)"),
            (true, false) => format!(
                "{prefix}Skipping {} {subject} (target already exists)",
                action.to_lowercase()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(target_exists: bool) -> TemplateOperation {
        TemplateOperation::Copy {
            source: PathBuf::from("/tmp/in/file.bin"),
            target: PathBuf::from("/tmp/out/file.bin"),
            mode: None,
            target_exists,
        }
    }

    fn write(target_exists: bool) -> TemplateOperation {
        TemplateOperation::Write {
            target: PathBuf::from("/tmp/out/file.txt"),
            content: String::new(),
            mode: Some(0o644),
            target_exists,
        }
    }

    #[test]
    fn copy_operation_logs_basic_message() {
        assert_eq!(
            copy(false).get_message(false, false),
            "Copying '/tmp/in/file.bin' to '/tmp/out/file.bin'"
        );
    }

    #[test]
    fn copy_operation_logs_overwrite_message() {
        assert_eq!(
            copy(true).get_message(true, false),
            "Copying '/tmp/in/file.bin' to '/tmp/out/file.bin' (overwriting existing file)"
        );
    }

    #[test]
    fn copy_operation_skips_when_not_confirmed() {
        assert_eq!(
            copy(true).get_message(false, false),
            "Skipping copying '/tmp/in/file.bin' to '/tmp/out/file.bin' (target already exists)"
        );
    }

    #[test]
    fn write_operation_messages() {
        assert_eq!(write(false).get_message(false, false), "Writing to '/tmp/out/file.txt'");
        assert_eq!(
            write(true).get_message(true, false),
            "Writing to '/tmp/out/file.txt' (overwriting existing file)"
        );
    }

    #[test]
    fn create_directory_messages() {
        let target = PathBuf::from("/tmp/out/dir");
        let missing = TemplateOperation::CreateDirectory {
            target: target.clone(),
            mode: None,
            target_exists: false,
        };
        let existing =
            TemplateOperation::CreateDirectory { target, mode: None, target_exists: true };
        assert_eq!(missing.get_message(false, false), "Creating directory '/tmp/out/dir'");
        assert_eq!(
            existing.get_message(false, false),
            "Skipping directory creation '/tmp/out/dir' (already exists)"
        );
    }

    #[test]
    fn test_dry_run_messages() {
        let op = copy(false);
        let dry_run_message = op.get_message(false, true);
        let normal_message = op.get_message(false, false);
        assert_eq!(dry_run_message, format!("[DRY RUN] {normal_message}"));
    }

    #[test]
    fn outcomes_by_kind() {
        assert_eq!(write(false).outcome(), Outcome::Rendered);
        assert_eq!(copy(false).outcome(), Outcome::Copied);
        let link = TemplateOperation::Symlink {
            link: PathBuf::from("../file.txt"),
            target: PathBuf::from("/tmp/out/alias"),
            target_exists: false,
        };
        assert_eq!(link.outcome(), Outcome::Copied);
        assert_eq!(link.target_path(), Path::new("/tmp/out/alias"));
    }

    #[test]
    fn error_context_names_the_paths() {
        let context = copy(false).error_context();
        assert!(context.contains("copy"));
        assert!(context.contains("/tmp/in/file.bin"));
        assert!(context.contains("/tmp/out/file.bin"));
        assert!(write(false).error_context().contains("write '/tmp/out/file.txt'"));
    }
}
