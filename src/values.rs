//! Template values: the nested key/value environment handed to templates.
//!
//! Values are layered from value files (later files win), `--set` overrides
//! and the `values` block of every `.tome.yaml` on the way down the tree.
//! Objects merge recursively; everything else is replaced.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{([^}]+)\}\}|\$\{([^}]+)\}").unwrap());

/// Nested template variables.
///
/// Cloning is a deep copy: every derived tome owns its values, so sibling
/// variants never observe each other's overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(Map<String, Value>);

impl Values {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Deep-merges `src` into `self`. `src` wins on conflicts.
    pub fn merge(&mut self, src: &Values) {
        merge_maps(&mut self.0, &src.0);
    }

    /// Assigns `raw_value` at a dotted path such as `app.db.port`.
    ///
    /// Intermediate objects are created, and any non-object found on the way
    /// is replaced by one. The raw value is coerced with [`parse_scalar`].
    pub fn set_path(&mut self, dotted_key: &str, raw_value: &str) {
        let mut keys = dotted_key.split('.').peekable();
        let mut current = &mut self.0;

        while let Some(key) = keys.next() {
            if keys.peek().is_none() {
                current.insert(key.to_string(), parse_scalar(raw_value));
                return;
            }
            let slot = current.entry(key.to_string()).or_insert(Value::Null);
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
    }

    /// Applies `key=value` overrides in order.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) -> Result<()> {
        for raw in overrides {
            let raw = raw.as_ref();
            let (key, value) = raw.split_once('=').ok_or_else(|| {
                Error::ConfigError(format!("'{raw}' must be in key=value format"))
            })?;
            self.set_path(key, value);
        }
        Ok(())
    }

    /// Loads and merges YAML value files in declaration order.
    ///
    /// `${VAR}` references are substituted from the environment before parsing.
    pub fn from_files<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut values = Values::new();
        for file in files {
            let file = file.as_ref();
            let raw = std::fs::read_to_string(file).map_err(Error::io_at(file))?;
            let parsed = Self::from_yaml_str(&substitute_env_vars(&raw)).map_err(|e| {
                Error::ConfigError(format!("invalid values file {}: {e}", file.display()))
            })?;
            log::debug!("Loaded values from {}", file.display());
            values.merge(&parsed);
        }
        Ok(values)
    }

    /// Parses a YAML mapping. An empty document yields empty values.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        match serde_yaml::from_str::<Value>(text)? {
            Value::Null => Ok(Values::new()),
            Value::Object(map) => Ok(Values(map)),
            other => Err(Error::ConfigError(format!(
                "expected a mapping of values, found {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Values {
    fn from(map: Map<String, Value>) -> Self {
        Values(map)
    }
}

impl TryFrom<Value> for Values {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Values(map)),
            Value::Null => Ok(Values::new()),
            other => Err(Error::ConfigError(format!(
                "values must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }
}

/// Recursive merge of `src` into `dst`.
///
/// - Objects on both sides: merged key by key
/// - Arrays: replaced, never concatenated
/// - Scalars and type mismatches: `src` wins
pub fn merge_maps(dst: &mut Map<String, Value>, src: &Map<String, Value>) {
    for (key, src_value) in src {
        match (dst.get_mut(key), src_value) {
            (Some(Value::Object(dst_map)), Value::Object(src_map)) => {
                merge_maps(dst_map, src_map);
            }
            _ => {
                dst.insert(key.clone(), src_value.clone());
            }
        }
    }
}

/// Coerces a raw `--set` value into the most specific YAML-like scalar.
pub fn parse_scalar(raw: &str) -> Value {
    match raw {
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }

    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }

    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return Value::Array(
            inner.split(',').map(|part| Value::String(part.trim().to_string())).collect(),
        );
    }

    Value::String(raw.to_string())
}

/// Replaces `${VAR}` with the environment variable `VAR` (empty when unset).
/// The escaped form `${{VAR}}` is kept as the literal text `${VAR}`.
pub fn substitute_env_vars(text: &str) -> String {
    ENV_VAR
        .replace_all(text, |caps: &Captures| {
            if let Some(escaped) = caps.get(1) {
                format!("${{{}}}", escaped.as_str())
            } else {
                std::env::var(&caps[2]).unwrap_or_default()
            }
        })
        .into_owned()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Values {
        Values::try_from(value).unwrap()
    }

    #[test]
    fn merge_recurses_into_objects() {
        let mut dst = values(json!({"db": {"host": "localhost", "port": 5432}}));
        dst.merge(&values(json!({"db": {"port": 6543}})));
        assert_eq!(dst.to_value(), json!({"db": {"host": "localhost", "port": 6543}}));
    }

    #[test]
    fn merge_replaces_arrays_and_mismatches() {
        let mut dst = values(json!({"list": [1, 2, 3], "mixed": {"a": 1}, "s": "x"}));
        dst.merge(&values(json!({"list": [9], "mixed": "flat", "s": {"now": "map"}})));
        assert_eq!(
            dst.to_value(),
            json!({"list": [9], "mixed": "flat", "s": {"now": "map"}})
        );
    }

    #[test]
    fn merge_into_clone_leaves_sources_untouched() {
        let a = values(json!({"shared": {"x": 1}, "only_a": true}));
        let b = values(json!({"shared": {"y": 2}, "only_b": true}));
        let (a_before, b_before) = (a.clone(), b.clone());

        let mut merged = a.clone();
        merged.merge(&b);
        merged.set_path("shared.z", "3");

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
        assert_eq!(merged.to_value()["shared"], json!({"x": 1, "y": 2, "z": 3}));
    }

    #[test]
    fn set_path_creates_and_overwrites_intermediates() {
        let mut v = values(json!({"app": "scalar"}));
        v.set_path("app.name", "demo");
        v.set_path("a.b.c", "true");
        assert_eq!(v.to_value(), json!({"app": {"name": "demo"}, "a": {"b": {"c": true}}}));
    }

    #[test]
    fn parse_scalar_picks_the_most_specific_type() {
        assert_eq!(parse_scalar("True"), json!(true));
        assert_eq!(parse_scalar("false"), json!(false));
        assert_eq!(parse_scalar("~"), Value::Null);
        assert_eq!(parse_scalar("null"), Value::Null);
        assert_eq!(parse_scalar("42"), json!(42));
        assert_eq!(parse_scalar("-7"), json!(-7));
        assert_eq!(parse_scalar("2.5"), json!(2.5));
        assert_eq!(parse_scalar("{a, b ,c}"), json!(["a", "b", "c"]));
        assert_eq!(parse_scalar("hello"), json!("hello"));
        assert_eq!(parse_scalar("NaN"), json!("NaN"));
    }

    #[test]
    fn overrides_require_key_value_form() {
        let mut v = Values::new();
        v.apply_overrides(&["a.b=1", "c=x=y"]).unwrap();
        assert_eq!(v.to_value(), json!({"a": {"b": 1}, "c": "x=y"}));
        assert!(matches!(v.apply_overrides(&["novalue"]), Err(Error::ConfigError(_))));
    }

    #[test]
    fn env_vars_are_substituted_and_escapes_preserved() {
        std::env::set_var("TOME_VALUES_TEST_VAR", "sub");
        let out = substitute_env_vars(
            "a: ${TOME_VALUES_TEST_VAR}\nb: ${{TOME_VALUES_TEST_VAR}}\nc: ${TOME_UNSET_VAR_XYZ}",
        );
        assert_eq!(out, "a: sub\nb: ${TOME_VALUES_TEST_VAR}\nc: ");
    }

    #[test]
    fn value_files_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.yaml");
        let second = dir.path().join("second.yaml");
        std::fs::write(&first, "name: first\nnested:\n  keep: 1\n  swap: a\n").unwrap();
        std::fs::write(&second, "nested:\n  swap: b\n").unwrap();

        let v = Values::from_files(&[first, second]).unwrap();
        assert_eq!(v.to_value(), json!({"name": "first", "nested": {"keep": 1, "swap": "b"}}));
    }

    #[test]
    fn value_file_must_be_a_mapping() {
        assert!(Values::from_yaml_str("").unwrap().is_empty());
        assert!(matches!(Values::from_yaml_str("- a\n- b\n"), Err(Error::ConfigError(_))));
    }
}
