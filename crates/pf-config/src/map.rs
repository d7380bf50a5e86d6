//! The configuration map and its typed accessors.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::raw::RawValue;
use crate::{ConfigError, ConfigResult};

/// String key -> ordered list of string values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the line-oriented format.
    ///
    /// Each non-empty line is `key:value1,value2,...`. Text after `#` is a
    /// comment. Later lines override earlier ones.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut map = Self::new();
        for (i, raw_line) in text.lines().enumerate() {
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let (key, values) = line.split_once(':').ok_or_else(|| ConfigError::Parse {
                line: i + 1,
                reason: format!("expected 'key:value', found '{line}'"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: i + 1,
                    reason: "empty key".to_string(),
                });
            }

            let values = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            map.entries.insert(key.to_string(), values);
        }
        Ok(map)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let raw: BTreeMap<String, RawValue> = serde_yaml::from_str(text)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let raw: BTreeMap<String, RawValue> = serde_json::from_str(text)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: BTreeMap<String, RawValue>) -> Self {
        Self {
            entries: raw
                .into_iter()
                .map(|(k, v)| (k, v.into_strings()))
                .collect(),
        }
    }

    /// Set a single-valued key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Set a list-valued key.
    pub fn set_list<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Set `key` only if it is absent.
    pub fn set_default(&mut self, key: &str, value: &str) {
        if !self.includes(key) {
            self.set(key, value);
        }
    }

    pub fn includes(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: &ConfigMap) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Fail with every missing key listed.
    pub fn check_required(&self, keys: &[&str]) -> ConfigResult<()> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !self.includes(k))
            .map(|k| k.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing { keys: missing })
        }
    }

    pub fn get(&self, key: &str) -> ConfigResult<&[String]> {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| ConfigError::Missing {
                keys: vec![key.to_string()],
            })
    }

    /// First value of `key`.
    pub fn first(&self, key: &str) -> ConfigResult<&str> {
        let values = self.get(key)?;
        values
            .first()
            .map(String::as_str)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value: String::new(),
                reason: "no value given".to_string(),
            })
    }

    pub fn get_f64(&self, key: &str) -> ConfigResult<f64> {
        parse_value(key, self.first(key)?)
    }

    pub fn get_usize(&self, key: &str) -> ConfigResult<usize> {
        parse_value(key, self.first(key)?)
    }

    pub fn get_u64(&self, key: &str) -> ConfigResult<u64> {
        parse_value(key, self.first(key)?)
    }

    /// Accepts `true`/`false`/`1`/`0` (case-insensitive).
    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        let value = self.first(key)?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "expected true/false".to_string(),
            }),
        }
    }

    pub fn get_f64_list(&self, key: &str) -> ConfigResult<Vec<f64>> {
        self.get(key)?
            .iter()
            .map(|v| parse_value(key, v))
            .collect()
    }

    pub fn f64_or(&self, key: &str, default: f64) -> ConfigResult<f64> {
        if self.includes(key) {
            self.get_f64(key)
        } else {
            Ok(default)
        }
    }

    pub fn usize_or(&self, key: &str, default: usize) -> ConfigResult<usize> {
        if self.includes(key) {
            self.get_usize(key)
        } else {
            Ok(default)
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> ConfigResult<u64> {
        if self.includes(key) {
            self.get_u64(key)
        } else {
            Ok(default)
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        if self.includes(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> ConfigResult<&'a str> {
        if self.includes(key) {
            self.first(key)
        } else {
            Ok(default)
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
