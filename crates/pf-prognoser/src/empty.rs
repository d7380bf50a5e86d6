//! Template prognoser that only logs.

use pf_config::ConfigMap;
use pf_results::ProgData;

use crate::common::CommonSettings;
use crate::data::SensorView;
use crate::error::PrognoserResult;
use crate::prognoser::Prognoser;

/// Starting point for new prognosers.
#[derive(Debug, Clone)]
pub struct EmptyPrognoser {
    results: ProgData,
    module: String,
    steps: u64,
}

impl EmptyPrognoser {
    pub fn new(config: &ConfigMap) -> PrognoserResult<Self> {
        let settings = CommonSettings::from_config(config)?;
        let module = settings.module_name();
        tracing::debug!(module = %module, "configuring");
        Ok(Self {
            results: settings.new_results(),
            module,
            steps: 0,
        })
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Prognoser for EmptyPrognoser {
    fn step(&mut self, _sensors: &SensorView<'_>) -> PrognoserResult<()> {
        tracing::trace!(module = %self.module, "running monitor step");
        tracing::trace!(module = %self.module, "running prediction step");
        self.steps += 1;
        self.results
            .internals
            .insert("steps".to_string(), self.steps as f64);
        Ok(())
    }

    fn set_history(&mut self, last: &ProgData) -> PrognoserResult<()> {
        if let Some(steps) = last.internals.get("steps") {
            self.steps = *steps as u64;
            self.results.internals.insert("steps".to_string(), *steps);
        }
        Ok(())
    }

    fn results(&self) -> &ProgData {
        &self.results
    }
}
