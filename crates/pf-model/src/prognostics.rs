//! PrognosticsModel trait: failure threshold, event state, input derivation
//! and predicted outputs on top of a SystemModel.

use pf_core::{
    InputVector, NameList, OutputVector, PfError, PfResult, PredictedOutputVector, StateVector,
};

use crate::shape::PrognosticsShape;
use crate::system::SystemModel;

/// Trait for models used by state estimators and RUL predictors.
///
/// Implementors provide the four raw equations. Callers use the `*_eqn`
/// methods, which check argument lengths against the shape before calling
/// the raw equation and check the result length afterwards. A length
/// mismatch on entry is a `PfError::Precondition`; a model returning a
/// wrongly sized result is a `PfError::Invariant`.
/// The raw equations are public only so models can be implemented outside
/// this crate; calling them directly skips the shape checks.
///
/// All equations must be deterministic functions of their arguments.
/// The threshold is expected (not required) to stay true once reached along
/// a degradation trajectory; predictors tolerate models that flip back.
pub trait PrognosticsModel: SystemModel {
    fn prognostics_shape(&self) -> &PrognosticsShape;

    /// True iff the component has reached its failure condition.
    fn threshold(&self, t: f64, x: &StateVector, u: &InputVector) -> PfResult<bool>;

    /// Normalized degradation per event: 1.0 healthy, 0.0 failed.
    fn event_state(&self, x: &[f64]) -> PfResult<Vec<f64>>;

    /// Turn model-specific load parameters into a full input vector.
    fn derive_input(
        &self,
        t: f64,
        params: &[f64],
        load_estimate: &[f64],
    ) -> PfResult<InputVector>;

    /// Auxiliary diagnostic quantities not present in the outputs.
    fn predicted_output(
        &self,
        t: f64,
        x: &StateVector,
        u: &InputVector,
        z: &OutputVector,
    ) -> PfResult<PredictedOutputVector>;

    fn threshold_eqn(&self, t: f64, x: &StateVector, u: &InputVector) -> PfResult<bool> {
        x.ensure_len(self.state_size())?;
        u.ensure_len(self.input_names().len())?;
        self.threshold(t, x, u)
    }

    fn event_state_eqn(&self, x: &[f64]) -> PfResult<Vec<f64>> {
        PfError::check_len("state", self.state_size(), x.len())?;
        let es = self.event_state(x)?;
        let expected = self.event_names().len();
        if es.len() != expected {
            return Err(PfError::Invariant {
                what: format!(
                    "event state returned {} values for {} events",
                    es.len(),
                    expected
                ),
            });
        }
        Ok(es)
    }

    fn input_eqn(&self, t: f64, params: &[f64], load_estimate: &[f64]) -> PfResult<InputVector> {
        PfError::check_len(
            "input parameters",
            self.input_parameter_count(),
            params.len(),
        )?;
        let u = self.derive_input(t, params, load_estimate)?;
        if u.len() != self.input_names().len() {
            return Err(PfError::Invariant {
                what: format!(
                    "input equation returned {} values for {} inputs",
                    u.len(),
                    self.input_names().len()
                ),
            });
        }
        Ok(u)
    }

    fn predicted_output_eqn(
        &self,
        t: f64,
        x: &StateVector,
        u: &InputVector,
        z: &OutputVector,
    ) -> PfResult<PredictedOutputVector> {
        x.ensure_len(self.state_size())?;
        u.ensure_len(self.input_names().len())?;
        z.ensure_len(self.output_names().len())?;
        let p = self.predicted_output(t, x, u, z)?;
        if p.len() != self.predicted_outputs().len() {
            return Err(PfError::Invariant {
                what: format!(
                    "predicted output equation returned {} values for {} names",
                    p.len(),
                    self.predicted_outputs().len()
                ),
            });
        }
        Ok(p)
    }

    fn input_parameter_count(&self) -> usize {
        self.prognostics_shape().input_parameter_count()
    }

    fn predicted_outputs(&self) -> &NameList {
        self.prognostics_shape().predicted_outputs()
    }

    fn predicted_output_vector(&self) -> PredictedOutputVector {
        self.prognostics_shape().predicted_output_vector()
    }

    fn event_names(&self) -> &NameList {
        self.prognostics_shape().events()
    }
}
