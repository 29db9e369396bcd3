//! Depth-first traversal of the source tree.
//!
//! Every directory is listed in name order. When it holds a `.tome.yaml`, its
//! entries are walked once per tome the manifest resolves to; otherwise they
//! are walked with the tome that reached the directory.

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::constants::MANIFEST_FILE;
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::renderer::TemplateRenderer;
use crate::template::{OperationWriter, Outcome, TemplateProcessor};
use crate::tome::{load_manifest, Tome};

/// Per-outcome entry counts of a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub copied: usize,
    pub rendered: usize,
    pub skipped: usize,
}

impl WalkSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Copied => self.copied += 1,
            Outcome::Rendered => self.rendered += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

impl AddAssign for WalkSummary {
    fn add_assign(&mut self, other: Self) {
        self.copied += other.copied;
        self.rendered += other.rendered;
        self.skipped += other.skipped;
    }
}

pub struct Walker<'a> {
    engine: &'a dyn TemplateRenderer,
    writer: OperationWriter<'a>,
}

impl<'a> Walker<'a> {
    pub fn new(engine: &'a dyn TemplateRenderer, writer: OperationWriter<'a>) -> Self {
        Self { engine, writer }
    }

    /// Renders `path` and everything below it with `tome`.
    ///
    /// The first error aborts the walk; outputs written before it stay.
    pub fn walk(&self, tome: &Tome, path: &Path) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        if path.file_name() == Some(OsStr::new(MANIFEST_FILE)) {
            return Ok(summary);
        }
        if !tome.should_include(path) {
            debug!("Skipping: {}", path.display());
            return Ok(summary);
        }

        let metadata = fs::symlink_metadata(path).map_err(Error::io_at(path))?;
        let operation = TemplateProcessor::new(self.engine, tome).process(path)?;
        summary.record(self.writer.apply(&operation)?);

        if !metadata.is_dir() {
            return Ok(summary);
        }

        let entries = sorted_entries(path)?;
        let manifest = path.join(MANIFEST_FILE);

        if manifest.is_file() {
            let tomes = load_manifest(&manifest, tome, self.engine)?;
            for child in &tomes {
                info!("Tome {} -> {}", child.source().display(), child.target().display());
                for entry in &entries {
                    summary += self.walk(child, entry)?;
                }
            }
        } else {
            for entry in &entries {
                summary += self.walk(tome, entry)?;
            }
        }

        Ok(summary)
    }

    /// Renders the single template at `path` into `out`.
    ///
    /// Only the content is rendered; the path is neither templated nor
    /// classified.
    pub fn render_file(&self, tome: &Tome, path: &Path, out: &mut dyn Write) -> Result<()> {
        let template = fs::read_to_string(path).map_err(Error::io_at(path))?;
        let content = tome.template(self.engine, &template, path.to_str_checked()?)?;
        out.write_all(content.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Lists the direct children of `dir` in file-name order.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            entry.map(DirEntry::into_path).map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                match e.into_io_error() {
                    Some(source) => Error::IoAt { path, source },
                    None => Error::path(path, "filesystem loop while listing"),
                }
            })
        })
        .collect()
}
