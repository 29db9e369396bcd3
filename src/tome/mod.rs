//! Scoped rendering configuration.
//!
//! A [`Tome`] says how one subtree is rendered: where it comes from, where it
//! goes, which files take part, which are copied verbatim and which values the
//! templates see. The root tome is built from the command line; every
//! `.tome.yaml` found on the way down derives one or more child tomes from the
//! tome that was active in its directory (see [`manifest`]).

pub mod manifest;

use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};

use serde_json::{json, Value};

use crate::constants::TOME_CONTEXT_KEY;
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::pattern::{self, PatternSet};
use crate::renderer::TemplateRenderer;
use crate::values::Values;

pub use manifest::{load_manifest, TomeRecord};

#[derive(Debug, Clone)]
pub struct Tome {
    source: PathBuf,
    target: PathBuf,
    mode: Option<u32>,
    strip: Vec<String>,
    include: PatternSet,
    exclude: PatternSet,
    copy: PatternSet,
    temp: PatternSet,
    values: Values,
}

/// Collects the fields of a [`Tome`] and validates them in [`TomeBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct TomeBuilder {
    source: PathBuf,
    target: PathBuf,
    mode: Option<u32>,
    strip: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    copy: Vec<String>,
    temp: Vec<String>,
    values: Values,
}

impl TomeBuilder {
    pub fn mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn strip(mut self, strip: Vec<String>) -> Self {
        self.strip = strip;
        self
    }

    pub fn include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn copy(mut self, copy: Vec<String>) -> Self {
        self.copy = copy;
        self
    }

    pub fn temp(mut self, temp: Vec<String>) -> Self {
        self.temp = temp;
        self
    }

    pub fn values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    /// Builds the tome, rejecting include+exclude and copy+temp combinations.
    pub fn build(self) -> Result<Tome> {
        if !self.include.is_empty() && !self.exclude.is_empty() {
            return Err(Error::ConfigError(
                "cannot use both include and exclude patterns".into(),
            ));
        }
        if !self.copy.is_empty() && !self.temp.is_empty() {
            return Err(Error::ConfigError(
                "cannot use both copy-only and template-only patterns".into(),
            ));
        }

        Ok(Tome {
            source: self.source,
            target: self.target,
            mode: self.mode,
            strip: self.strip,
            include: PatternSet::new(&self.include),
            exclude: PatternSet::new(&self.exclude),
            copy: PatternSet::new(&self.copy),
            temp: PatternSet::new(&self.temp),
            values: self.values,
        })
    }
}

impl Tome {
    pub fn builder<S: Into<PathBuf>, T: Into<PathBuf>>(source: S, target: T) -> TomeBuilder {
        TomeBuilder { source: source.into(), target: target.into(), ..Default::default() }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    pub fn strip(&self) -> &[String] {
        &self.strip
    }

    pub fn include(&self) -> &[String] {
        self.include.patterns()
    }

    pub fn exclude(&self) -> &[String] {
        self.exclude.patterns()
    }

    pub fn copy(&self) -> &[String] {
        self.copy.patterns()
    }

    pub fn temp(&self) -> &[String] {
        self.temp.patterns()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Whether `path` takes part in rendering. The tome's own root always does.
    pub fn should_include(&self, path: &Path) -> bool {
        path == self.source
            || pattern::should_include(path, &self.source, &self.include, &self.exclude)
    }

    /// Whether `path` is copied verbatim rather than rendered.
    pub fn should_copy(&self, path: &Path) -> bool {
        pattern::should_copy(path, &self.source, &self.copy, &self.temp)
    }

    /// The values plus a `__tome__` object describing this tome.
    pub fn context(&self) -> Value {
        let mut context = self.values.as_map().clone();
        context.insert(
            TOME_CONTEXT_KEY.to_string(),
            json!({
                "source": self.source.display().to_string(),
                "target": self.target.display().to_string(),
                "mode": self.mode.map(format_file_mode).unwrap_or_default(),
                "strip": self.strip,
                "include": self.include.patterns(),
                "exclude": self.exclude.patterns(),
                "copy": self.copy.patterns(),
                "temp": self.temp.patterns(),
            }),
        );
        Value::Object(context)
    }

    /// Renders `text` against this tome's context. `name` identifies the
    /// template in diagnostics and anchors relative `include_file` paths.
    pub fn template(
        &self,
        engine: &dyn TemplateRenderer,
        text: &str,
        name: &str,
    ) -> Result<String> {
        engine.render(text, &self.context(), Some(name))
    }

    /// Computes where `input` lands in the output tree.
    ///
    /// The path relative to the source root is rendered as a template, each
    /// segment loses at most one strip suffix, and the non-empty segments are
    /// joined to the target directory.
    pub fn output_path(&self, engine: &dyn TemplateRenderer, input: &Path) -> Result<PathBuf> {
        let relative = input.strip_prefix(&self.source).map_err(|e| {
            Error::path(input, format!("not under '{}': {e}", self.source.display()))
        })?;
        if relative.as_os_str().is_empty() {
            return Ok(self.target.clone());
        }
        let relative = relative.to_str_checked()?;

        let rendered = self.template(engine, relative, input.to_str_checked()?)?;
        let stripped = strip_suffixes(&rendered, &self.strip);

        // segments that rendered empty collapse into their parent
        Ok(stripped
            .split(MAIN_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .fold(self.target.clone(), |path, segment| path.join(segment)))
    }
}

/// Removes at most one configured suffix from every path segment.
///
/// The first suffix in `suffixes` that ends a segment wins. A segment is never
/// stripped down to nothing. A leading separator is preserved.
pub fn strip_suffixes(path: &str, suffixes: &[String]) -> String {
    if suffixes.is_empty() {
        return path.to_string();
    }
    path.split(MAIN_SEPARATOR)
        .map(|segment| {
            suffixes
                .iter()
                .filter(|suffix| !suffix.is_empty())
                .find_map(|suffix| segment.strip_suffix(suffix.as_str()))
                .filter(|stripped| !stripped.is_empty())
                .unwrap_or(segment)
        })
        .collect::<Vec<_>>()
        .join(MAIN_SEPARATOR_STR)
}

/// Parses a permission string, either octal (`644`, `0755`) or the nine
/// character symbolic form (`rw-r--r--`).
pub fn parse_file_mode(mode: &str) -> Result<u32> {
    if let Ok(bits) = u32::from_str_radix(mode, 8) {
        return Ok(bits);
    }

    if mode.len() != 9 {
        return Err(Error::ConfigError(format!("invalid symbolic file mode: {mode}")));
    }

    const SYMBOLS: [(u8, u32); 9] = [
        (b'r', 0o400),
        (b'w', 0o200),
        (b'x', 0o100),
        (b'r', 0o040),
        (b'w', 0o020),
        (b'x', 0o010),
        (b'r', 0o004),
        (b'w', 0o002),
        (b'x', 0o001),
    ];

    mode.bytes().zip(SYMBOLS).try_fold(0, |bits, (given, (symbol, bit))| match given {
        b'-' => Ok(bits),
        c if c == symbol => Ok(bits | bit),
        c => Err(Error::ConfigError(format!(
            "unexpected character '{}' in symbolic mode {mode}",
            c as char
        ))),
    })
}

/// Formats permission bits in the nine character symbolic form.
pub fn format_file_mode(mode: u32) -> String {
    const LETTERS: [char; 3] = ['r', 'w', 'x'];
    (0..9)
        .map(|i| {
            if mode & (0o400 >> i) != 0 {
                LETTERS[i % 3]
            } else {
                '-'
            }
        })
        .collect()
}
