//! Monte Carlo time-of-event prediction.
//!
//! Each sample draws an initial state from the state estimate and a load from
//! the load estimator, then steps the model with process noise until the
//! threshold is reached or the horizon elapses. Samples run in parallel, each
//! with its own seeded generator, so a fixed seed gives repeatable results.

use pf_config::ConfigMap;
use pf_core::{PfError, PredictedOutputVector};
use pf_model::{PrognosticsModel, SystemModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use crate::error::{SimError, SimResult};
use crate::estimator::{StateEstimate, StateSampler};
use crate::load::LoadEstimator;

/// Slack when comparing step times against save times.
const TIME_EPS: f64 = 1e-9;

/// Predicted times of the threshold event, one entry per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPrediction {
    pub name: String,
    /// `None` where the sample did not reach the threshold within the horizon
    pub time_of_event: Vec<Option<f64>>,
}

impl EventPrediction {
    /// Fraction of samples that reached the threshold.
    pub fn probability(&self) -> f64 {
        if self.time_of_event.is_empty() {
            return 0.0;
        }
        let reached = self.time_of_event.iter().flatten().count();
        reached as f64 / self.time_of_event.len() as f64
    }

    /// Mean time of event over the samples that reached the threshold.
    pub fn mean(&self) -> Option<f64> {
        let reached: Vec<f64> = self.time_of_event.iter().flatten().copied().collect();
        if reached.is_empty() {
            None
        } else {
            Some(reached.iter().sum::<f64>() / reached.len() as f64)
        }
    }

    /// Median time of event over the samples that reached the threshold.
    pub fn median(&self) -> Option<f64> {
        let mut reached: Vec<f64> = self.time_of_event.iter().flatten().copied().collect();
        if reached.is_empty() {
            return None;
        }
        reached.sort_by(f64::total_cmp);
        let mid = reached.len() / 2;
        if reached.len() % 2 == 0 {
            Some(0.5 * (reached[mid - 1] + reached[mid]))
        } else {
            Some(reached[mid])
        }
    }
}

/// Sampled trajectory of one predicted output.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPrediction {
    pub name: String,
    /// Save times (seconds)
    pub times: Vec<f64>,
    /// Values at each save time from the samples still running at that time
    pub samples: Vec<Vec<f64>>,
}

impl TrajectoryPrediction {
    pub fn mean_at(&self, index: usize) -> Option<f64> {
        let values = self.samples.get(index)?;
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

/// Result of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Time the prediction starts from (seconds)
    pub time: f64,
    /// Threshold event, named after the model's first declared event
    pub event: EventPrediction,
    /// Event state of the estimate mean, one value per declared event
    pub event_state: Vec<(String, f64)>,
    pub trajectories: Vec<TrajectoryPrediction>,
}

struct SampleOutcome {
    time_of_event: Option<f64>,
    saved: Vec<PredictedOutputVector>,
}

/// Monte Carlo predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloPredictor {
    num_samples: usize,
    horizon: f64,
    time_step: f64,
    save_interval: f64,
    max_steps: usize,
    process_noise: Vec<f64>,
    input_parameters: Vec<f64>,
    seed: u64,
}

impl MonteCarloPredictor {
    pub fn new(num_samples: usize, horizon: f64) -> SimResult<Self> {
        if num_samples == 0 {
            return Err(SimError::InvalidArg {
                what: "numSamples must be positive".to_string(),
            });
        }
        if !(horizon > 0.0) {
            return Err(SimError::InvalidArg {
                what: "horizon must be positive".to_string(),
            });
        }
        Ok(Self {
            num_samples,
            horizon,
            time_step: 1.0,
            save_interval: 10.0,
            max_steps: 1_000_000,
            process_noise: Vec::new(),
            input_parameters: Vec::new(),
            seed: rand::random(),
        })
    }

    pub fn with_time_step(mut self, time_step: f64) -> SimResult<Self> {
        if !(time_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "timeStep must be positive".to_string(),
            });
        }
        self.time_step = time_step;
        Ok(self)
    }

    pub fn with_save_interval(mut self, save_interval: f64) -> SimResult<Self> {
        if !(save_interval > 0.0) {
            return Err(SimError::InvalidArg {
                what: "saveInterval must be positive".to_string(),
            });
        }
        self.save_interval = save_interval;
        Ok(self)
    }

    /// Cap on integration steps per sample; a capped sample ends without an event.
    pub fn with_max_steps(mut self, max_steps: usize) -> SimResult<Self> {
        if max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "maxSteps must be positive".to_string(),
            });
        }
        self.max_steps = max_steps;
        Ok(self)
    }

    /// Process noise variances per state; empty means no noise.
    pub fn with_process_noise(mut self, process_noise: Vec<f64>) -> SimResult<Self> {
        if process_noise.iter().any(|q| !(*q >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "process noise variances must be non-negative".to_string(),
            });
        }
        self.process_noise = process_noise;
        Ok(self)
    }

    pub fn with_input_parameters(mut self, params: Vec<f64>) -> Self {
        self.input_parameters = params;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reads `Predictor.numSamples` and `Predictor.horizon` (required) plus
    /// the optional `Predictor.timeStep`, `Predictor.saveInterval`,
    /// `Predictor.maxSteps`, `Predictor.inputParameters`, `Predictor.seed` and `Model.processNoise`.
    pub fn from_config(config: &ConfigMap) -> SimResult<Self> {
        config.check_required(&["Predictor.numSamples", "Predictor.horizon"])?;
        let mut predictor = Self::new(
            config.get_usize("Predictor.numSamples")?,
            config.get_f64("Predictor.horizon")?,
        )?
        .with_time_step(config.f64_or("Predictor.timeStep", 1.0)?)?
        .with_save_interval(config.f64_or("Predictor.saveInterval", 10.0)?)?
        .with_max_steps(config.usize_or("Predictor.maxSteps", 1_000_000)?)?;
        if config.includes("Predictor.inputParameters") {
            predictor =
                predictor.with_input_parameters(config.get_f64_list("Predictor.inputParameters")?);
        }
        if config.includes("Predictor.seed") {
            predictor = predictor.with_seed(config.get_u64("Predictor.seed")?);
        }
        if config.includes("Model.processNoise") {
            predictor = predictor.with_process_noise(config.get_f64_list("Model.processNoise")?)?;
        }
        Ok(predictor)
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Predict the time of event from `estimate` at time `t`.
    pub fn predict(
        &self,
        model: &dyn PrognosticsModel,
        t: f64,
        estimate: &StateEstimate,
        load: &dyn LoadEstimator,
    ) -> SimResult<Prediction> {
        let n = model.state_size();
        estimate.mean.ensure_len(n)?;
        let noise_sd: Vec<f64> = if self.process_noise.is_empty() {
            vec![0.0; n]
        } else {
            PfError::check_len("process noise", n, self.process_noise.len())?;
            self.process_noise.iter().map(|q| q.sqrt()).collect()
        };
        PfError::check_len(
            "input parameters",
            model.input_parameter_count(),
            self.input_parameters.len(),
        )?;

        if self.horizon / self.time_step > self.max_steps as f64 {
            tracing::warn!(
                horizon = self.horizon,
                time_step = self.time_step,
                max_steps = self.max_steps,
                "samples will stop at the step cap before the horizon"
            );
        }

        let sampler = estimate.sampler()?;
        let outcomes = (0..self.num_samples)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                self.run_sample(model, t, &sampler, load, &noise_sd, &mut rng)
            })
            .collect::<SimResult<Vec<SampleOutcome>>>()?;

        let event_state = model
            .event_names()
            .iter()
            .map(str::to_string)
            .zip(model.event_state_eqn(estimate.mean.as_slice())?)
            .collect();
        let event = EventPrediction {
            name: model
                .event_names()
                .get(0)
                .unwrap_or(pf_model::DEFAULT_EVENT)
                .to_string(),
            time_of_event: outcomes.iter().map(|o| o.time_of_event).collect(),
        };
        let trajectories = self.assemble_trajectories(model, t, &outcomes);

        tracing::debug!(
            samples = self.num_samples,
            probability = event.probability(),
            "prediction complete"
        );
        Ok(Prediction {
            time: t,
            event,
            event_state,
            trajectories,
        })
    }

    fn run_sample(
        &self,
        model: &dyn PrognosticsModel,
        t: f64,
        sampler: &StateSampler,
        load: &dyn LoadEstimator,
        noise_sd: &[f64],
        rng: &mut StdRng,
    ) -> SimResult<SampleOutcome> {
        let mut x = sampler.sample(&mut *rng);
        let load_sample = load.sample_load(t, &mut *rng)?;
        let end = t + self.horizon;
        let save_time = |k: usize| t + k as f64 * self.save_interval;
        let mut tau = t;
        let mut step = 0;
        let mut held: Option<PredictedOutputVector> = None;
        let mut saved = Vec::new();

        loop {
            let u = model.input_eqn(tau, &self.input_parameters, &load_sample)?;
            let z = model.output_eqn(tau, &x, &u)?;
            let current = model.predicted_output_eqn(tau, &x, &u, &z)?;

            // Save times passed over by the last step hold that step's value
            if let Some(previous) = &held {
                while save_time(saved.len()) < tau - TIME_EPS
                    && save_time(saved.len()) <= end + TIME_EPS
                {
                    saved.push(previous.clone());
                }
            }
            while save_time(saved.len()) <= tau.min(end) + TIME_EPS {
                saved.push(current.clone());
            }

            if model.threshold_eqn(tau, &x, &u)? {
                return Ok(SampleOutcome {
                    time_of_event: Some(tau),
                    saved,
                });
            }
            if tau >= end - TIME_EPS || step >= self.max_steps {
                return Ok(SampleOutcome {
                    time_of_event: None,
                    saved,
                });
            }
            let noise: Vec<f64> = noise_sd
                .iter()
                .map(|sd| {
                    let v: f64 = StandardNormal.sample(&mut *rng);
                    sd * v
                })
                .collect();
            x = model.state_eqn_with_noise(tau, &x, &u, &noise, self.time_step)?;
            tau += self.time_step;
            step += 1;
            held = Some(current);
        }
    }

    fn assemble_trajectories(
        &self,
        model: &dyn PrognosticsModel,
        t: f64,
        outcomes: &[SampleOutcome],
    ) -> Vec<TrajectoryPrediction> {
        let save_count = (self.horizon / self.save_interval).floor() as usize + 1;
        let times: Vec<f64> = (0..save_count)
            .map(|k| t + k as f64 * self.save_interval)
            .collect();
        model
            .predicted_outputs()
            .iter()
            .enumerate()
            .map(|(j, name)| TrajectoryPrediction {
                name: name.to_string(),
                times: times.clone(),
                samples: (0..save_count)
                    .map(|k| {
                        outcomes
                            .iter()
                            .filter_map(|o| o.saved.get(k).map(|p| p[j]))
                            .collect()
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(times: &[Option<f64>]) -> EventPrediction {
        EventPrediction {
            name: "EOL".to_string(),
            time_of_event: times.to_vec(),
        }
    }

    #[test]
    fn event_statistics() {
        let e = event(&[Some(10.0), None, Some(30.0), Some(20.0)]);
        assert_eq!(e.probability(), 0.75);
        assert_eq!(e.mean(), Some(20.0));
        assert_eq!(e.median(), Some(20.0));

        let never = event(&[None, None]);
        assert_eq!(never.probability(), 0.0);
        assert_eq!(never.mean(), None);
        assert_eq!(never.median(), None);
    }

    #[test]
    fn construction_is_validated() {
        assert!(MonteCarloPredictor::new(0, 100.0).is_err());
        assert!(MonteCarloPredictor::new(10, 0.0).is_err());
        let p = MonteCarloPredictor::new(10, 100.0).unwrap();
        assert!(p.clone().with_time_step(-1.0).is_err());
        assert!(p.clone().with_save_interval(0.0).is_err());
        assert!(p.clone().with_max_steps(0).is_err());
        assert!(p.with_process_noise(vec![-1.0]).is_err());
    }

    #[test]
    fn config_requires_samples_and_horizon() {
        let mut config = ConfigMap::new();
        config.set("Predictor.numSamples", "20");
        assert!(matches!(
            MonteCarloPredictor::from_config(&config),
            Err(SimError::Config(_))
        ));
        config.set("Predictor.horizon", "1000");
        config.set("Predictor.seed", "42");
        config.set("Predictor.maxSteps", "500");
        let p = MonteCarloPredictor::from_config(&config).unwrap();
        assert_eq!(p.max_steps(), 500);
        assert_eq!(p.num_samples(), 20);
        assert_eq!(p.horizon(), 1000.0);
        assert_eq!(p.seed(), 42);
    }
}
