//! Unset variable detection.
//!
//! MiniJinja reports which top-level names a template reads without defining
//! them. Positions are recovered with a lexical scan of the template's
//! expression and statement tags.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use minijinja::Environment;
use regex::Regex;

use super::functions::FUNCTION_NAMES;
use crate::error::Result;

/// Globals provided by the engine itself.
const ENGINE_GLOBALS: &[&str] = &[
    "range",
    "dict",
    "debug",
    "namespace",
    "loop",
    "self",
    "super",
    "caller",
    "varargs",
    "kwargs",
];

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").unwrap());

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[A-Za-z_][A-Za-z0-9_]*|\S"#).unwrap()
});

/// An unset top-level variable and where the template first reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey {
    pub name: String,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
}

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} missing key '{}'", self.line, self.column, self.name)
    }
}

/// Lists every read of a top-level name that `context` does not define.
///
/// Reports are ordered by position. A name the scan cannot locate (for
/// example one only read inside a macro call) is reported once at `1:1`.
pub fn find_missing_keys(
    env: &Environment<'_>,
    template: &str,
    context: &serde_json::Value,
    name: &str,
) -> Result<Vec<MissingKey>> {
    let tmpl = env.template_from_named_str(name, template)?;
    let undeclared: BTreeSet<String> = tmpl
        .undeclared_variables(false)
        .into_iter()
        .filter(|key| context.get(key).is_none())
        .filter(|key| !FUNCTION_NAMES.contains(&key.as_str()))
        .filter(|key| !ENGINE_GLOBALS.contains(&key.as_str()))
        .collect();

    let mut missing = Vec::new();
    for key in undeclared {
        let offsets = locate(template, &key);
        if offsets.is_empty() {
            missing.push(MissingKey { name: key, line: 1, column: 1 });
            continue;
        }
        for offset in offsets {
            let (line, column) = position(template, offset);
            missing.push(MissingKey { name: key.clone(), line, column });
        }
    }
    missing.sort_by_key(|key| (key.line, key.column));
    Ok(missing)
}

/// Byte offsets where `key` is read as a variable.
///
/// Attribute names (`a.key`), filter and test names (`| key`, `is key`) and
/// string contents are skipped.
fn locate(template: &str, key: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    for tag in TAG.find_iter(template) {
        let mut previous = "";
        for token in TOKEN.find_iter(tag.as_str()) {
            let text = token.as_str();
            if text == key && !matches!(previous, "." | "|" | "is") {
                offsets.push(tag.start() + token.start());
            }
            previous = text;
        }
    }
    offsets
}

fn position(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
