//! Prognoser built from a prognostics model, an open-loop state estimator
//! and a Monte Carlo predictor.
//!
//! Model inputs and outputs are read by their model names, so `inTags` must
//! map every input and output name to a global tag. Observed inputs are fed
//! to load estimators that accept them.

use std::sync::Arc;

use pf_config::ConfigMap;
use pf_core::{InputVector, OutputVector, StateVector};
use pf_model::{ModelFactory, PrognosticsModel, SystemModel};
use pf_results::{ProgData, TrajectoryRecord};
use pf_sim::{
    LoadEstimator, MonteCarloPredictor, OpenLoopEstimator, Prediction, StateEstimate,
    StateEstimator, load_estimator_from_config,
};

use crate::common::CommonSettings;
use crate::data::SensorView;
use crate::error::{PrognoserError, PrognoserResult};
use crate::prognoser::Prognoser;

pub struct ModelBasedPrognoser {
    results: ProgData,
    module: String,
    model: Arc<dyn PrognosticsModel>,
    estimator: OpenLoopEstimator,
    predictor: MonteCarloPredictor,
    load: Box<dyn LoadEstimator>,
    last_time: Option<f64>,
}

impl ModelBasedPrognoser {
    pub fn new(config: &ConfigMap) -> PrognoserResult<Self> {
        Self::with_factory(config, &ModelFactory::with_builtins())
    }

    /// Like [`ModelBasedPrognoser::new`], resolving `model` in `factory`.
    pub fn with_factory(config: &ConfigMap, factory: &ModelFactory) -> PrognoserResult<Self> {
        let settings = CommonSettings::from_config(config)?;
        config.check_required(&["model"])?;
        let model_name = config.first("model")?;
        let model: Arc<dyn PrognosticsModel> = Arc::from(factory.create(model_name, config)?);

        let estimator = OpenLoopEstimator::from_config(Arc::clone(&model), config)?;
        let predictor = MonteCarloPredictor::from_config(config)?;
        let load = load_estimator_from_config(config)?;

        let module = settings.module_name();
        tracing::debug!(
            module = %module,
            model = model_name,
            samples = predictor.num_samples(),
            horizon = predictor.horizon(),
            "configured model-based prognoser"
        );
        Ok(Self {
            results: settings.new_results(),
            module,
            model,
            estimator,
            predictor,
            load,
            last_time: None,
        })
    }

    pub fn model(&self) -> &dyn PrognosticsModel {
        self.model.as_ref()
    }

    pub fn state_estimate(&self) -> PrognoserResult<StateEstimate> {
        Ok(self.estimator.state_estimate()?)
    }

    fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.model
            .input_names()
            .iter()
            .chain(self.model.output_names().iter())
    }

    /// Latest inputs and outputs, stamped with the newest reading time.
    fn read(&self, sensors: &SensorView<'_>) -> PrognoserResult<(f64, InputVector, OutputVector)> {
        let mut time = f64::NEG_INFINITY;
        let mut u = self.model.input_vector();
        for (i, name) in self.model.input_names().iter().enumerate() {
            let datum = sensors.value(name)?;
            u.set(i, datum.value)?;
            time = time.max(datum.time);
        }
        let mut z = self.model.output_vector();
        for (i, name) in self.model.output_names().iter().enumerate() {
            let datum = sensors.value(name)?;
            z.set(i, datum.value)?;
            time = time.max(datum.time);
        }
        Ok((time, u, z))
    }

    fn publish(&mut self, t: f64, estimate: &StateEstimate, prediction: &Prediction) {
        let results = &mut self.results;
        results.time = t;
        for (name, value) in &prediction.event_state {
            let event = results.events.entry(name.clone()).or_default();
            event.event_state = *value;
            if *name == prediction.event.name {
                event.time_of_event = prediction.event.time_of_event.clone();
                event.probability = prediction.event.probability();
            }
        }
        results.state = estimate
            .mean
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("x{i}"), *v))
            .collect();
        results.trajectories = prediction
            .trajectories
            .iter()
            .map(|traj| {
                (
                    traj.name.clone(),
                    TrajectoryRecord {
                        times: traj.times.clone(),
                        samples: traj.samples.clone(),
                    },
                )
            })
            .collect();
        results.internals.insert("lastTime".to_string(), t);
    }
}

impl Prognoser for ModelBasedPrognoser {
    fn check_input_validity(&mut self, sensors: &SensorView<'_>) -> PrognoserResult<()> {
        for name in self.sensor_names() {
            if let Ok(datum) = sensors.value(name)
                && !(datum.value.is_finite() && datum.time.is_finite())
            {
                return Err(PrognoserError::InvalidInput {
                    what: format!("{name} = {} at t = {}", datum.value, datum.time),
                });
            }
        }
        Ok(())
    }

    fn is_enough_data(&self, sensors: &SensorView<'_>) -> bool {
        self.sensor_names().all(|name| sensors.has(name))
    }

    fn step(&mut self, sensors: &SensorView<'_>) -> PrognoserResult<()> {
        let (t, u, z) = self.read(sensors)?;

        match self.last_time {
            None => {
                let x0 = self.model.initialize(&u, &z)?;
                self.estimator.initialize(t, x0)?;
                tracing::debug!(module = %self.module, t, "initialized state");
            }
            Some(last) if t <= last => {
                tracing::trace!(module = %self.module, t, "no new data");
                return Ok(());
            }
            Some(_) => self.estimator.step(t, &u, &z)?,
        }
        self.last_time = Some(t);

        if self.load.can_add_load() {
            self.load.add_load(u.as_slice())?;
        }

        tracing::trace!(module = %self.module, t, "running prediction step");
        let estimate = self.estimator.state_estimate()?;
        let prediction =
            self.predictor
                .predict(self.model.as_ref(), t, &estimate, self.load.as_ref())?;
        self.publish(t, &estimate, &prediction);
        Ok(())
    }

    fn check_result_validity(&mut self) -> PrognoserResult<()> {
        for (name, event) in &self.results.events {
            if !(0.0..=1.0).contains(&event.event_state) {
                return Err(PrognoserError::InvalidResult {
                    what: format!("event state of {name} is {}", event.event_state),
                });
            }
            if !(0.0..=1.0).contains(&event.probability) {
                return Err(PrognoserError::InvalidResult {
                    what: format!("probability of {name} is {}", event.probability),
                });
            }
        }
        Ok(())
    }

    /// Restores published results, and the state estimate when the saved
    /// state covers every model state.
    fn set_history(&mut self, last: &ProgData) -> PrognoserResult<()> {
        self.results.time = last.time;
        self.results.events = last.events.clone();
        self.results.state = last.state.clone();
        self.results.trajectories = last.trajectories.clone();
        self.results.internals = last.internals.clone();

        let n = self.model.state_size();
        let values: Option<Vec<f64>> = (0..n)
            .map(|i| last.state.get(&format!("x{i}")).copied())
            .collect();
        match (values, last.internals.get("lastTime")) {
            (Some(values), Some(t)) => {
                self.estimator.initialize(*t, StateVector::from_vec(values))?;
                self.last_time = Some(*t);
                tracing::debug!(module = %self.module, t, "restored state from history");
            }
            _ => tracing::debug!(module = %self.module, "history has no usable state"),
        }
        Ok(())
    }

    fn results(&self) -> &ProgData {
        &self.results
    }
}

impl std::fmt::Debug for ModelBasedPrognoser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBasedPrognoser")
            .field("module", &self.module)
            .field("predictor", &self.predictor)
            .field("last_time", &self.last_time)
            .finish()
    }
}
