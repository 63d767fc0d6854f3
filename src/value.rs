//! Config value model.
//!
//! YAML documents are converted into [`ConfigValue`] trees so the rest of
//! the crate never touches `serde_yaml` types directly. The enum also owns
//! the two opaque-on-serialize variants: sensitive sub-trees and the live
//! logger handle both render as fixed placeholder strings, and dates render
//! as `YYYY-MM-DD`, whenever the config is serialized for logging.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::logging::LoggerHandle;
use crate::sensitive::SensitiveDict;

/// Placeholder emitted in place of sensitive sub-trees.
pub const SENSITIVE_PLACEHOLDER: &str = "<SensitiveDict>";

/// Placeholder emitted in place of the logger handle.
pub const LOGGER_PLACEHOLDER: &str = "<Logger>";

/// A parsed configuration mapping with normalized string keys.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Explicit YAML null.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// A scalar that parsed exactly as a `YYYY-MM-DD` calendar date.
    Date(NaiveDate),
    /// Sequence of values.
    List(Vec<ConfigValue>),
    /// Nested mapping.
    Map(ConfigMap),
    /// Redacted sub-tree (the auth section).
    Sensitive(SensitiveDict),
    /// Live logger handle attached by the loader.
    Logger(LoggerHandle),
}

impl ConfigValue {
    /// Convert a parsed YAML value into a config value.
    ///
    /// Unquoted and quoted scalars are indistinguishable after parsing, so
    /// any string of the exact form `YYYY-MM-DD` becomes a [`Self::Date`].
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or_default()),
                Self::Int,
            ),
            serde_yaml::Value::String(s) => match parse_date(&s) {
                Some(date) => Self::Date(date),
                None => Self::String(s),
            },
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.into_iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = ConfigMap::new();
                for (k, v) in mapping {
                    map.insert(yaml_key_to_string(&k), Self::from_yaml(v));
                }
                Self::Map(map)
            }
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(tagged.value),
        }
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the date payload, if this is a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Short type tag used in validation error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
            Self::Sensitive(_) => "sensitive mapping",
            Self::Logger(_) => "logger",
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Self::Sensitive(_) => serializer.serialize_str(SENSITIVE_PLACEHOLDER),
            Self::Logger(_) => serializer.serialize_str(LOGGER_PLACEHOLDER),
        }
    }
}

/// Normalize a raw top-level key: trim, then replace spaces with underscores.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}

/// Render a YAML mapping key as a string lookup key.
///
/// Non-string scalar keys (`60: x`, `true: y`) are stringified the way they
/// appear in the document.
pub fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
