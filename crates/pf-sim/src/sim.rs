//! Fixed-step simulation of a prognostics model up to its threshold.

use pf_core::{InputVector, OutputVector, PredictedOutputVector, StateVector};
use pf_model::{PrognosticsModel, SystemModel};

use crate::error::{SimError, SimResult};
use crate::load::LoadEstimator;

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Simulated span after the start time (seconds)
    pub horizon: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            horizon: 5000.0,
            max_steps: 1_000_000,
            record_every: 10,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive".to_string(),
            });
        }
        if !(self.horizon >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "horizon must be non-negative".to_string(),
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive".to_string(),
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    pub x: Vec<StateVector>,
    pub z: Vec<OutputVector>,
    pub predicted: Vec<PredictedOutputVector>,
    /// Event state per recorded point, one value per declared event
    pub event_state: Vec<Vec<f64>>,
    /// First time the threshold equation held, if within the horizon
    pub time_of_event: Option<f64>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    fn push<M: PrognosticsModel + ?Sized>(
        &mut self,
        model: &M,
        t: f64,
        x: &StateVector,
        u: &InputVector,
    ) -> SimResult<()> {
        let z = model.output_eqn(t, x, u)?;
        let predicted = model.predicted_output_eqn(t, x, u, &z)?;
        let event_state = model.event_state_eqn(x.as_slice())?;
        self.t.push(t);
        self.x.push(x.clone());
        self.z.push(z);
        self.predicted.push(predicted);
        self.event_state.push(event_state);
        Ok(())
    }
}

/// Step `model` from `(t0, x0)` under the load supplied by `load` until the
/// threshold is reached, the horizon elapses, or `max_steps` is hit.
///
/// The first and last points are always recorded.
pub fn simulate_to_threshold<M: PrognosticsModel + ?Sized>(
    model: &M,
    t0: f64,
    x0: &StateVector,
    load: &dyn LoadEstimator,
    params: &[f64],
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    opts.validate()?;
    x0.ensure_len(model.state_size())?;

    let end = t0 + opts.horizon;
    let mut record = SimRecord::default();
    let mut t = t0;
    let mut x = x0.clone();
    let mut step = 0;

    loop {
        let u = model.input_eqn(t, params, &load.estimate_load(t)?)?;
        let reached = model.threshold_eqn(t, &x, &u)?;
        let done = reached || t >= end || step >= opts.max_steps;

        if step % opts.record_every == 0 || done {
            record.push(model, t, &x, &u)?;
        }
        if reached {
            record.time_of_event = Some(t);
        }
        if done {
            break;
        }

        x = model.state_eqn(t, &x, &u, opts.dt)?;
        t += opts.dt;
        step += 1;
    }

    tracing::debug!(
        steps = step,
        time_of_event = ?record.time_of_event,
        "simulation finished"
    );
    Ok(record)
}
