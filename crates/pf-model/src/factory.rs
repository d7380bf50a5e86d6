//! Name-keyed registry of model constructors.

use std::collections::BTreeMap;

use pf_config::ConfigMap;
use pf_core::{PfError, PfResult};

use crate::battery::Battery;
use crate::prognostics::PrognosticsModel;

/// Builds a model from configuration.
pub type ModelConstructor = fn(&ConfigMap) -> PfResult<Box<dyn PrognosticsModel>>;

#[derive(Clone, Default)]
pub struct ModelFactory {
    constructors: BTreeMap<String, ModelConstructor>,
}

impl ModelFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every model shipped in this crate registered.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("Battery", |config| {
            Ok(Box::new(Battery::from_config(config)?) as Box<dyn PrognosticsModel>)
        });
        factory
    }

    /// Register (or replace) a constructor under `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: ModelConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn create(&self, name: &str, config: &ConfigMap) -> PfResult<Box<dyn PrognosticsModel>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| PfError::UnknownName {
                name: name.to_string(),
                context: "model factory".to_string(),
            })?;
        tracing::debug!(model = name, "creating model");
        constructor(config)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory")
            .field("models", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_battery() {
        let factory = ModelFactory::with_builtins();
        assert_eq!(factory.names().collect::<Vec<_>>(), vec!["Battery"]);
        let model = factory.create("Battery", &ConfigMap::new()).unwrap();
        assert_eq!(model.state_size(), 8);
    }

    #[test]
    fn unknown_model_fails() {
        let factory = ModelFactory::with_builtins();
        assert!(matches!(
            factory.create("Pump", &ConfigMap::new()),
            Err(PfError::UnknownName { .. })
        ));
    }
}
