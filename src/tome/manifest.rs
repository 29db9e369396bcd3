//! `.tome.yaml` loading and inheritance.
//!
//! A manifest is rendered through the parent tome first, so it can branch on
//! upstream values, then parsed as one record or a list of records. Every
//! record becomes a child tome that renders the manifest's directory; fields
//! the record leaves out are inherited from the parent.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{parse_file_mode, Tome};
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::renderer::TemplateRenderer;
use crate::values::Values;

/// One configuration record of a manifest. Absent fields inherit.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomeRecord {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "mode_text")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub strip: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub copy: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub temp: Vec<String>,
    #[serde(default)]
    pub values: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    })
}

/// `mode: 644` arrives as an integer; its digits are read as octal later.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModeText {
    Text(String),
    Digits(u64),
}

fn mode_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<ModeText>::deserialize(deserializer)?.map(|mode| match mode {
        ModeText::Text(text) => text,
        ModeText::Digits(digits) => digits.to_string(),
    }))
}

impl TomeRecord {
    /// Resolves this record against `parent` for the manifest directory `dir`.
    pub fn resolve(self, parent: &Tome, dir: &Path) -> Result<Tome> {
        let relative = dir.strip_prefix(parent.source()).map_err(|e| {
            Error::path(dir, format!("not under '{}': {e}", parent.source().display()))
        })?;
        let default_target = parent.target().join(relative);

        let target = match self.target.as_deref() {
            None | Some("") => default_target,
            Some(target) if Path::new(target).is_absolute() => PathBuf::from(target),
            Some(target) => default_target
                .parent()
                .map(|dir_parent| dir_parent.join(target))
                .unwrap_or_else(|| PathBuf::from(target)),
        };

        let mode = match self.mode.as_deref() {
            None | Some("") => parent.mode(),
            Some(mode) => Some(parse_file_mode(mode)?),
        };

        let mut values = parent.values().clone();
        if let Some(own) = self.values {
            values.merge(&Values::from(own));
        }

        let strip =
            if self.strip.is_empty() { parent.strip().to_vec() } else { self.strip };

        let (include, exclude) = if self.include.is_empty() && self.exclude.is_empty() {
            (parent.include().to_vec(), parent.exclude().to_vec())
        } else {
            (self.include, self.exclude)
        };

        let (copy, temp) = if self.copy.is_empty() && self.temp.is_empty() {
            (parent.copy().to_vec(), parent.temp().to_vec())
        } else {
            (self.copy, self.temp)
        };

        Tome::builder(dir, target)
            .mode(mode)
            .strip(strip)
            .include(include)
            .exclude(exclude)
            .copy(copy)
            .temp(temp)
            .values(values)
            .build()
    }
}

/// Parses rendered manifest text into its records.
pub fn parse_records(text: &str) -> Result<Vec<TomeRecord>> {
    let document: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| Error::ConfigError(format!("invalid YAML in tome file: {e}")))?;

    let raw_records = match document {
        serde_yaml::Value::Null => Vec::new(),
        serde_yaml::Value::Sequence(records) => records,
        record @ serde_yaml::Value::Mapping(_) => vec![record],
        other => {
            return Err(Error::ConfigError(format!(
                "a tome file must hold a mapping or a list of mappings, found {other:?}"
            )))
        }
    };

    raw_records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            // `- ` with nothing after it is an empty record
            let raw = if raw.is_null() {
                serde_yaml::Value::Mapping(Default::default())
            } else {
                raw
            };
            serde_yaml::from_value(raw).map_err(|e| {
                Error::ConfigError(format!("invalid tome record {}: {e}", index + 1))
            })
        })
        .collect()
}

/// Loads the manifest at `file` and resolves its fan-out set against `parent`.
///
/// The returned tomes are in manifest order; the directory is walked once per
/// tome, each with its own copy of the values.
pub fn load_manifest(
    file: &Path,
    parent: &Tome,
    engine: &dyn TemplateRenderer,
) -> Result<Vec<Tome>> {
    let raw = std::fs::read_to_string(file).map_err(Error::io_at(file))?;
    let rendered = parent.template(engine, &raw, file.to_str_checked()?)?;
    debug!("Rendered tome file {}:\n{rendered}", file.display());

    let records = parse_records(&rendered)?;
    if records.is_empty() {
        return Err(Error::ConfigError(format!(
            "tome file {} holds no records",
            file.display()
        )));
    }

    let dir = file.parent().ok_or_else(|| Error::path(file, "has no parent directory"))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.resolve(parent, dir).map_err(|e| match e {
                Error::ConfigError(message) => Error::ConfigError(format!(
                    "{} record {}: {message}",
                    file.display(),
                    index + 1
                )),
                other => other,
            })
        })
        .collect()
}
