//! Glob pattern sets used to classify paths.
//!
//! A tome carries four pattern lists: `include`/`exclude` decide whether a
//! path is processed at all, `copy`/`temp` decide whether its content is copied
//! verbatim or rendered as a template.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use log::warn;

/// A compiled list of glob patterns.
///
/// Patterns starting with `/` are matched against absolute paths; all others
/// are matched against the path relative to the owning tome's source root.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<String>,
    matchers: Vec<Matcher>,
}

#[derive(Debug, Clone)]
struct Matcher {
    absolute: bool,
    glob: GlobMatcher,
}

impl PatternSet {
    /// Compiles the patterns. Malformed patterns are logged and never match.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns: Vec<String> =
            patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let matchers = patterns
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .filter_map(|pattern| {
                match GlobBuilder::new(pattern).literal_separator(true).build() {
                    Ok(glob) => Some(Matcher {
                        absolute: pattern.starts_with('/'),
                        glob: glob.compile_matcher(),
                    }),
                    Err(err) => {
                        warn!("Ignoring invalid glob pattern '{pattern}': {err}");
                        None
                    }
                }
            })
            .collect();

        Self { patterns, matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The patterns as written, including any that failed to compile.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if any pattern matches `path`.
    pub fn is_match(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).ok();
        self.matchers.iter().any(|matcher| {
            if matcher.absolute {
                matcher.glob.is_match(path)
            } else {
                relative.is_some_and(|rel| matcher.glob.is_match(rel))
            }
        })
    }
}

/// Decides whether `path` is processed at all.
///
/// A non-empty include list is an allow-list; otherwise a non-empty exclude
/// list is a deny-list; otherwise everything is included.
pub fn should_include(
    path: &Path,
    root: &Path,
    include: &PatternSet,
    exclude: &PatternSet,
) -> bool {
    if !include.is_empty() {
        return include.is_match(path, root);
    }
    if !exclude.is_empty() {
        return !exclude.is_match(path, root);
    }
    true
}

/// Decides whether `path` is copied verbatim (`true`) or rendered (`false`).
///
/// A non-empty copy list names the files to copy; otherwise a non-empty temp
/// list names the only files to render; otherwise everything is rendered.
pub fn should_copy(path: &Path, root: &Path, copy: &PatternSet, temp: &PatternSet) -> bool {
    if !copy.is_empty() {
        return copy.is_match(path, root);
    }
    if !temp.is_empty() {
        return !temp.is_match(path, root);
    }
    false
}
