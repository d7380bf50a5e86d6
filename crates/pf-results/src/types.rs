//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Predicted occurrence of one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgEvent {
    /// Time-of-event samples; `None` where the sample never reached the event
    pub time_of_event: Vec<Option<f64>>,
    /// Probability the event occurs within the prediction horizon
    pub probability: f64,
    /// Current event state in [0, 1]
    pub event_state: f64,
}

impl ProgEvent {
    pub fn reached(&self) -> impl Iterator<Item = f64> + '_ {
        self.time_of_event.iter().flatten().copied()
    }
}

/// Sampled trajectory of one predicted output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub times: Vec<f64>,
    pub samples: Vec<Vec<f64>>,
}

/// Results published by a prognoser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgData {
    pub prognoser: String,
    pub component: String,
    pub unique_id: String,
    /// Time of the latest update (seconds)
    pub time: f64,
    #[serde(default)]
    pub events: BTreeMap<String, ProgEvent>,
    #[serde(default)]
    pub state: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub trajectories: BTreeMap<String, TrajectoryRecord>,
    /// Prognoser-specific values restored from history on restart
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub internals: BTreeMap<String, f64>,
}

impl ProgData {
    pub fn new(
        prognoser: impl Into<String>,
        component: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            prognoser: prognoser.into(),
            component: component.into(),
            unique_id: unique_id.into(),
            ..Self::default()
        }
    }

    pub fn event(&self, name: &str) -> Option<&ProgEvent> {
        self.events.get(name)
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }
}
