//! Sensor data: sources, an in-memory store and local-to-global tag lookup.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use pf_config::ConfigMap;

use crate::error::{PrognoserError, PrognoserResult};

/// A timestamped sensor value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    pub value: f64,
    /// Time of the reading (seconds)
    pub time: f64,
}

impl Datum {
    pub fn new(value: f64, time: f64) -> Self {
        Self { value, time }
    }
}

/// Anything that can answer "latest value for this global tag".
pub trait DataSource: Send + Sync {
    fn get(&self, tag: &str) -> Option<Datum>;
}

/// Thread-safe in-memory latest-value store.
#[derive(Debug, Default)]
pub struct DataStore {
    values: RwLock<HashMap<String, Datum>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tag: impl Into<String>, value: f64, time: f64) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag.into(), Datum::new(value, time));
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        tags.sort();
        tags
    }
}

impl DataSource for DataStore {
    fn get(&self, tag: &str) -> Option<Datum> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .copied()
    }
}

/// Map from the names a prognoser uses to the global tags of the system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    local_to_global: BTreeMap<String, String>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `inTags` entries of the form `local:global`.
    pub fn from_config(config: &ConfigMap) -> PrognoserResult<Self> {
        let mut tags = Self::new();
        if !config.includes("inTags") {
            return Ok(tags);
        }
        for entry in config.get("inTags")? {
            let (local, global) =
                entry
                    .split_once(':')
                    .ok_or_else(|| PrognoserError::InvalidTag {
                        entry: entry.clone(),
                    })?;
            let (local, global) = (local.trim(), global.trim());
            if local.is_empty() || global.is_empty() {
                return Err(PrognoserError::InvalidTag {
                    entry: entry.clone(),
                });
            }
            tracing::trace!(local, global, "registering tag");
            tags.insert(local, global);
        }
        Ok(tags)
    }

    pub fn insert(&mut self, local: impl Into<String>, global: impl Into<String>) {
        self.local_to_global.insert(local.into(), global.into());
    }

    pub fn global(&self, local: &str) -> Option<&str> {
        self.local_to_global.get(local).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }
}

/// Read access to sensor values by local name.
pub struct SensorView<'a> {
    tags: &'a TagMap,
    source: &'a dyn DataSource,
}

impl<'a> SensorView<'a> {
    pub fn new(tags: &'a TagMap, source: &'a dyn DataSource) -> Self {
        Self { tags, source }
    }

    pub fn value(&self, local: &str) -> PrognoserResult<Datum> {
        let tag = self
            .tags
            .global(local)
            .ok_or_else(|| PrognoserError::UnknownSensor {
                name: local.to_string(),
            })?;
        self.source
            .get(tag)
            .ok_or_else(|| PrognoserError::MissingData {
                name: local.to_string(),
                tag: tag.to_string(),
            })
    }

    /// True when `local` is registered and its tag has a value.
    pub fn has(&self, local: &str) -> bool {
        self.tags
            .global(local)
            .is_some_and(|tag| self.source.get(tag).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_local_global_pairs() {
        let config = ConfigMap::parse("inTags:power:bat1_power, voltage:bat1_v\n").unwrap();
        let tags = TagMap::from_config(&config).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.global("power"), Some("bat1_power"));
        assert_eq!(tags.global("voltage"), Some("bat1_v"));
        assert_eq!(tags.global("temperature"), None);
    }

    #[test]
    fn malformed_tag_is_rejected() {
        let mut config = ConfigMap::new();
        config.set("inTags", "power");
        assert!(matches!(
            TagMap::from_config(&config),
            Err(PrognoserError::InvalidTag { .. })
        ));
        config.set("inTags", ":bat1_power");
        assert!(TagMap::from_config(&config).is_err());
    }

    #[test]
    fn sensor_view_resolves_through_tags() {
        let store = DataStore::new();
        store.set("bat1_power", 8.0, 1.0);
        let mut tags = TagMap::new();
        tags.insert("power", "bat1_power");
        tags.insert("voltage", "bat1_v");

        let view = SensorView::new(&tags, &store);
        assert_eq!(view.value("power").unwrap(), Datum::new(8.0, 1.0));
        assert!(view.has("power"));
        assert!(!view.has("voltage"));
        assert!(matches!(
            view.value("voltage"),
            Err(PrognoserError::MissingData { .. })
        ));
        assert!(matches!(
            view.value("current"),
            Err(PrognoserError::UnknownSensor { .. })
        ));
        assert_eq!(store.tags(), vec!["bat1_power".to_string()]);
    }
}
