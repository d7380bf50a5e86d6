//! Name-keyed registry of prognoser constructors.

use std::collections::BTreeMap;
use std::sync::Arc;

use pf_config::ConfigMap;

use crate::common::CommonPrognoser;
use crate::data::DataSource;
use crate::empty::EmptyPrognoser;
use crate::error::{PrognoserError, PrognoserResult};
use crate::model_based::ModelBasedPrognoser;
use crate::prognoser::Prognoser;

/// Builds a prognoser from configuration.
pub type PrognoserConstructor = fn(&ConfigMap) -> PrognoserResult<Box<dyn Prognoser>>;

#[derive(Clone, Default)]
pub struct PrognoserFactory {
    constructors: BTreeMap<String, PrognoserConstructor>,
}

impl PrognoserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `Empty` and `ModelBasedPrognoser`.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("Empty", |config| {
            Ok(Box::new(EmptyPrognoser::new(config)?) as Box<dyn Prognoser>)
        });
        factory.register("ModelBasedPrognoser", |config| {
            Ok(Box::new(ModelBasedPrognoser::new(config)?) as Box<dyn Prognoser>)
        });
        factory
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: PrognoserConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Build the prognoser named by the `type` key.
    pub fn create(&self, config: &ConfigMap) -> PrognoserResult<Box<dyn Prognoser>> {
        config.check_required(&["type"])?;
        let name = config.first("type")?;
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| PrognoserError::UnknownPrognoser {
                    name: name.to_string(),
                })?;
        tracing::debug!(prognoser = name, "creating prognoser");
        constructor(config)
    }

    /// Build the prognoser and wrap it in a [`CommonPrognoser`].
    pub fn build(
        &self,
        config: &ConfigMap,
        source: Arc<dyn DataSource>,
    ) -> PrognoserResult<CommonPrognoser> {
        CommonPrognoser::new(config, self.create(config)?, source)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PrognoserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrognoserFactory")
            .field("prognosers", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}
