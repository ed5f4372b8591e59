//! Project configuration values and layered merging.
//!
//! A project is described by a flat string-keyed mapping assembled from
//! several layers (global defaults, environment settings, values derived
//! from target classification, user overrides). Later layers overwrite
//! earlier ones key by key.
//!
//! Once a `ProjectConfig` has been handed to a project variant it is
//! treated as read-only: consumers receive `&ProjectConfig` and may only
//! derive new mappings via [`ProjectConfig::merged`] or
//! [`ProjectConfig::with`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Error type for configuration lookups and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A key required by the selected project variant is absent.
    ///
    /// Raised before any template rendering so a missing key surfaces as a
    /// configuration error rather than a rendering failure.
    #[error("invalid configuration: required key `{key}` is missing")]
    MissingKey { key: String },

    /// A key is present but holds a value of the wrong shape.
    #[error("invalid configuration: key `{key}` is not a {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A single configuration value: scalar, list, or nested mapping.
///
/// `BTreeMap` is used for the mapping case so that serialization and
/// template substitution are deterministic.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Truthiness used by template conditionals: `false`, `0`, and empty
    /// strings/lists/maps are falsey; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Bool(b) => *b,
            ConfigValue::Int(i) => *i != 0,
            ConfigValue::Str(s) => !s.is_empty(),
            ConfigValue::List(l) => !l.is_empty(),
            ConfigValue::Map(m) => !m.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Text rendering used for `{{key}}` substitution in templates.
///
/// Lists render as space-separated items (matching shell argument lists in
/// bootstrap scripts); maps render as `{k=v, ...}` in key order.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Str(s) => write!(f, "{}", s),
            ConfigValue::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            ConfigValue::Map(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::List(value.into_iter().map(ConfigValue::Str).collect())
    }
}

impl From<Vec<i64>> for ConfigValue {
    fn from(value: Vec<i64>) -> Self {
        ConfigValue::List(value.into_iter().map(ConfigValue::Int).collect())
    }
}

/// Flat configuration mapping describing one analysis project.
///
/// Key order is stable (`BTreeMap`), which keeps the serialized
/// `project.json` descriptor and every rendered artifact deterministic for
/// identical inputs.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProjectConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value during assembly. Consumers holding `&ProjectConfig`
    /// cannot reach this; they derive new mappings instead.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }

    /// Look up a key, failing with `ConfigError::MissingKey` if absent.
    pub fn require(&self, key: &str) -> ConfigResult<&ConfigValue> {
        self.values.get(key).ok_or_else(|| ConfigError::MissingKey { key: key.to_string() })
    }

    /// Required boolean lookup.
    pub fn require_bool(&self, key: &str) -> ConfigResult<bool> {
        self.require(key)?
            .as_bool()
            .ok_or(ConfigError::WrongType { key: key.to_string(), expected: "boolean" })
    }

    /// Required string lookup.
    pub fn require_str(&self, key: &str) -> ConfigResult<&str> {
        self.require(key)?
            .as_str()
            .ok_or(ConfigError::WrongType { key: key.to_string(), expected: "string" })
    }

    /// Required list lookup.
    pub fn require_list(&self, key: &str) -> ConfigResult<&[ConfigValue]> {
        self.require(key)?
            .as_list()
            .ok_or(ConfigError::WrongType { key: key.to_string(), expected: "list" })
    }

    /// Verify that every named key is present, failing on the first absent
    /// one. Runs before template rendering is attempted.
    pub fn ensure_keys(&self, keys: &[&str]) -> ConfigResult<()> {
        for key in keys {
            if !self.values.contains_key(*key) {
                return Err(ConfigError::MissingKey { key: (*key).to_string() });
            }
        }
        Ok(())
    }

    /// Derive a new mapping with `overlay`'s keys overwriting this one's.
    pub fn merged(&self, overlay: &ProjectConfig) -> ProjectConfig {
        let mut values = self.values.clone();
        for (key, value) in &overlay.values {
            values.insert(key.clone(), value.clone());
        }
        ProjectConfig { values }
    }

    /// Derive a new mapping with a single additional/overwritten key.
    pub fn with(&self, key: impl Into<String>, value: impl Into<ConfigValue>) -> ProjectConfig {
        let mut derived = self.clone();
        derived.insert(key, value);
        derived
    }
}

impl FromIterator<(String, ConfigValue)> for ProjectConfig {
    fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
        ProjectConfig { values: iter.into_iter().collect() }
    }
}
