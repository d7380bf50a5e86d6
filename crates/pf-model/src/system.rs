//! SystemModel trait: the base dynamical system a prognostics model extends.

use pf_core::{InputVector, NameList, OutputVector, PfError, PfResult, StateVector};

use crate::shape::ModelShape;

/// Trait for discrete-time dynamical system models.
///
/// A SystemModel must implement:
/// - Its shape (state size, input and output names)
/// - State transition: x(t + dt) = f(t, x, u, dt)
/// - Output equation: z = h(t, x, u)
/// - Initialization of a state from a first input/output pair
///
/// Models hold only immutable configuration. All simulation history lives in
/// the vectors passed in and out, so one instance can serve many threads.
pub trait SystemModel: Send + Sync {
    fn shape(&self) -> &ModelShape;

    /// Advance the state by one step of length `dt`.
    fn state_eqn(&self, t: f64, x: &StateVector, u: &InputVector, dt: f64)
    -> PfResult<StateVector>;

    /// Compute the measurable outputs at the current state.
    fn output_eqn(&self, t: f64, x: &StateVector, u: &InputVector) -> PfResult<OutputVector>;

    /// Build an initial state consistent with the given input and output.
    fn initialize(&self, u: &InputVector, z: &OutputVector) -> PfResult<StateVector>;

    /// State transition with additive process noise scaled by `dt`.
    fn state_eqn_with_noise(
        &self,
        t: f64,
        x: &StateVector,
        u: &InputVector,
        n: &[f64],
        dt: f64,
    ) -> PfResult<StateVector> {
        PfError::check_len("process noise", self.state_size(), n.len())?;
        let mut next = self.state_eqn(t, x, u, dt)?;
        for (xi, ni) in next.as_mut_slice().iter_mut().zip(n) {
            *xi += dt * ni;
        }
        Ok(next)
    }

    fn state_size(&self) -> usize {
        self.shape().state_size()
    }

    fn input_names(&self) -> &NameList {
        self.shape().inputs()
    }

    fn output_names(&self) -> &NameList {
        self.shape().outputs()
    }

    fn state_vector(&self) -> StateVector {
        self.shape().state_vector()
    }

    fn input_vector(&self) -> InputVector {
        self.shape().input_vector()
    }

    fn output_vector(&self) -> OutputVector {
        self.shape().output_vector()
    }
}
