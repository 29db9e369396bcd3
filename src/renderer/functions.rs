//! Global functions available to every template.

use std::path::Path;

use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, Value};
use url::Url;

/// Names registered by [`register`], plus `include_file` which is bound per
/// render. Unset variable detection must not report them.
pub const FUNCTION_NAMES: &[&str] = &[
    "seq",
    "to_yaml",
    "from_yaml",
    "to_toml",
    "from_toml",
    "to_json",
    "from_json",
    "required",
    "include_file",
];

pub fn register(env: &mut Environment<'_>) {
    env.add_function("seq", seq);
    env.add_function("to_yaml", to_yaml);
    env.add_function("from_yaml", from_yaml);
    env.add_function("to_toml", to_toml);
    env.add_function("from_toml", from_toml);
    env.add_function("to_json", to_json);
    env.add_function("from_json", from_json);
    env.add_function("required", required);
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Integer sequences, inclusive on both ends.
///
/// - `seq(n)`: `1..=n`, counting down when `n < 1`
/// - `seq(start, end)`: step of one towards `end`
/// - `seq(start, step, end)`: empty when `step` points away from `end` or is zero
///
/// Any other arity yields an empty sequence.
pub fn seq(args: Rest<i64>) -> Vec<i64> {
    match args.as_slice() {
        [end] => {
            let step = if *end < 1 { -1 } else { 1 };
            stepped(1, step, *end)
        }
        [start, end] => {
            let step = if end < start { -1 } else { 1 };
            stepped(*start, step, *end)
        }
        [start, step, end] => stepped(*start, *step, *end),
        _ => Vec::new(),
    }
}

fn stepped(start: i64, step: i64, end: i64) -> Vec<i64> {
    if step == 0 || (step > 0 && start > end) || (step < 0 && start < end) {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current <= end) || (step < 0 && current >= end) {
        items.push(current);
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    items
}

pub fn to_yaml(value: Value) -> Result<String, Error> {
    serde_yaml::to_string(&value)
        .map_err(|e| invalid("cannot convert to YAML").with_source(e))
}

/// Parses YAML holding a mapping or a sequence.
pub fn from_yaml(text: &str) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_yaml::from_str(text)
        .map_err(|e| invalid("cannot convert from YAML").with_source(e))?;
    collection(parsed, "YAML")
}

pub fn to_toml(value: Value) -> Result<String, Error> {
    toml::to_string(&value).map_err(|e| invalid("cannot convert to TOML").with_source(e))
}

pub fn from_toml(text: &str) -> Result<Value, Error> {
    let table: toml::Table = toml::from_str(text)
        .map_err(|e| invalid("cannot convert from TOML").with_source(e))?;
    Ok(Value::from_serialize(&table))
}

pub fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value)
        .map_err(|e| invalid("cannot convert to JSON").with_source(e))
}

/// Parses JSON holding an object or an array.
pub fn from_json(text: &str) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| invalid("cannot convert from JSON").with_source(e))?;
    collection(parsed, "JSON")
}

fn collection(parsed: serde_json::Value, format: &str) -> Result<Value, Error> {
    match parsed {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            Ok(Value::from_serialize(&parsed))
        }
        _ => Err(invalid(format!("{format} must hold a mapping or a sequence"))),
    }
}

/// Passes `value` through, failing when it is undefined, none or empty.
pub fn required(value: Value) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() || value.len() == Some(0) {
        return Err(invalid("no value given for required parameter"));
    }
    Ok(value)
}

/// Where an `include_file` location points.
#[derive(Debug, PartialEq)]
pub enum IncludeSource {
    Url(Url),
    File(std::path::PathBuf),
}

impl IncludeSource {
    /// Resolves `location` against `anchor`, the name of the including
    /// template. Relative locations are taken from the anchor's directory, or
    /// joined onto the anchor URL when the including template was fetched.
    pub fn resolve(anchor: &str, location: &str) -> Result<Self, Error> {
        if let Some(url) = http_url(location) {
            return Ok(IncludeSource::Url(url));
        }
        if let Some(base) = http_url(anchor) {
            let url = base
                .join(location)
                .map_err(|e| invalid(format!("cannot resolve '{location}'")).with_source(e))?;
            return Ok(IncludeSource::Url(url));
        }

        let path = Path::new(location);
        if path.is_absolute() {
            return Ok(IncludeSource::File(path.to_path_buf()));
        }
        let dir = Path::new(anchor).parent().unwrap_or_else(|| Path::new(""));
        Ok(IncludeSource::File(dir.join(path)))
    }

    /// Template name for the fetched text; anchors nested includes.
    pub fn name(&self) -> String {
        match self {
            IncludeSource::Url(url) => url.to_string(),
            IncludeSource::File(path) => path.display().to_string(),
        }
    }

    pub fn fetch(&self) -> Result<String, Error> {
        match self {
            IncludeSource::Url(url) => {
                log::debug!("Fetching include {url}");
                reqwest::blocking::get(url.as_str())
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .map_err(|e| invalid(format!("cannot fetch '{url}'")).with_source(e))
            }
            IncludeSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                invalid(format!("cannot read '{}'", path.display())).with_source(e)
            }),
        }
    }
}

fn http_url(text: &str) -> Option<Url> {
    Url::parse(text).ok().filter(|url| matches!(url.scheme(), "http" | "https"))
}
