//! Contract tests for PrognosticsModel using a small two-state model.

use pf_core::{
    InputVector, OutputVector, PfError, PfResult, PredictedOutputVector, StateVector,
};
use pf_model::{ModelShape, PrognosticsModel, PrognosticsShape, SystemModel};
use proptest::prelude::*;

/// Linear wear model: x = [capacity, resistance], input = load.
struct WearModel {
    shape: PrognosticsShape,
}

impl WearModel {
    fn new() -> Self {
        Self {
            shape: PrognosticsShape::new(2, ["load"], ["voltage"], ["capacity", "resistance"])
                .unwrap(),
        }
    }
}

impl SystemModel for WearModel {
    fn shape(&self) -> &ModelShape {
        self.shape.base()
    }

    fn state_eqn(&self, _t: f64, x: &StateVector, u: &InputVector, dt: f64) -> PfResult<StateVector> {
        let mut next = x.clone();
        next[0] -= 0.01 * u[0] * dt;
        next[1] += 0.001 * u[0] * dt;
        Ok(next)
    }

    fn output_eqn(&self, _t: f64, x: &StateVector, u: &InputVector) -> PfResult<OutputVector> {
        Ok(OutputVector::from_vec(vec![4.0 * x[0] - u[0] * x[1]]))
    }

    fn initialize(&self, _u: &InputVector, _z: &OutputVector) -> PfResult<StateVector> {
        Ok(StateVector::from_vec(vec![1.0, 0.05]))
    }
}

impl PrognosticsModel for WearModel {
    fn prognostics_shape(&self) -> &PrognosticsShape {
        &self.shape
    }

    fn threshold(&self, _t: f64, x: &StateVector, _u: &InputVector) -> PfResult<bool> {
        Ok(x[0] <= 0.2)
    }

    fn event_state(&self, x: &[f64]) -> PfResult<Vec<f64>> {
        Ok(vec![((x[0] - 0.2) / 0.8).clamp(0.0, 1.0)])
    }

    fn derive_input(&self, _t: f64, params: &[f64], _load: &[f64]) -> PfResult<InputVector> {
        Ok(InputVector::from_vec(params.to_vec()))
    }

    fn predicted_output(
        &self,
        _t: f64,
        x: &StateVector,
        _u: &InputVector,
        _z: &OutputVector,
    ) -> PfResult<PredictedOutputVector> {
        Ok(PredictedOutputVector::from_vec(vec![x[0], x[1]]))
    }
}

/// Misbehaving model that drops a predicted output and an input slot.
struct ShortModel {
    shape: PrognosticsShape,
}

impl SystemModel for ShortModel {
    fn shape(&self) -> &ModelShape {
        self.shape.base()
    }

    fn state_eqn(&self, _t: f64, x: &StateVector, _u: &InputVector, _dt: f64) -> PfResult<StateVector> {
        Ok(x.clone())
    }

    fn output_eqn(&self, _t: f64, _x: &StateVector, _u: &InputVector) -> PfResult<OutputVector> {
        Ok(self.output_vector())
    }

    fn initialize(&self, _u: &InputVector, _z: &OutputVector) -> PfResult<StateVector> {
        Ok(self.state_vector())
    }
}

impl PrognosticsModel for ShortModel {
    fn prognostics_shape(&self) -> &PrognosticsShape {
        &self.shape
    }

    fn threshold(&self, _t: f64, _x: &StateVector, _u: &InputVector) -> PfResult<bool> {
        Ok(false)
    }

    fn event_state(&self, _x: &[f64]) -> PfResult<Vec<f64>> {
        Ok(vec![])
    }

    fn derive_input(&self, _t: f64, _params: &[f64], _load: &[f64]) -> PfResult<InputVector> {
        Ok(InputVector::zeros(1))
    }

    fn predicted_output(
        &self,
        _t: f64,
        _x: &StateVector,
        _u: &InputVector,
        _z: &OutputVector,
    ) -> PfResult<PredictedOutputVector> {
        Ok(PredictedOutputVector::zeros(1))
    }
}

#[test]
fn example_model_defaults() {
    let model = WearModel::new();
    assert_eq!(model.input_parameter_count(), 1);
    assert_eq!(model.predicted_outputs().as_slice(), &["capacity", "resistance"]);
    assert_eq!(model.predicted_output_vector().len(), 2);
    assert_eq!(model.predicted_output_vector().len(), model.predicted_outputs().len());
}

#[test]
fn input_eqn_rejects_wrong_parameter_count() {
    let model = WearModel::new();
    let err = model.input_eqn(0.0, &[1.0, 2.0], &[]).unwrap_err();
    assert_eq!(
        err,
        PfError::Precondition {
            what: "input parameters",
            expected: 1,
            actual: 2
        }
    );
    assert!(model.input_eqn(0.0, &[], &[]).is_err());
    assert_eq!(model.input_eqn(0.0, &[3.0], &[]).unwrap().as_slice(), &[3.0]);
}

#[test]
fn equations_check_vector_lengths() {
    let model = WearModel::new();
    let x = StateVector::from_vec(vec![1.0]);
    let u = InputVector::from_vec(vec![1.0]);
    assert!(matches!(
        model.threshold_eqn(0.0, &x, &u),
        Err(PfError::Precondition { .. })
    ));
    assert!(matches!(
        model.event_state_eqn(&[1.0, 2.0, 3.0]),
        Err(PfError::Precondition { .. })
    ));
    let x = StateVector::from_vec(vec![1.0, 0.05]);
    let z = OutputVector::from_vec(vec![1.0, 2.0]);
    assert!(matches!(
        model.predicted_output_eqn(0.0, &x, &u, &z),
        Err(PfError::Precondition { .. })
    ));
}

#[test]
fn wrongly_sized_results_are_invariant_violations() {
    let model = ShortModel {
        shape: PrognosticsShape::new(1, ["a", "b"], ["z"], ["p", "q"]).unwrap(),
    };
    let x = model.state_vector();
    let u = model.input_vector();
    let z = model.output_vector();
    assert!(matches!(
        model.predicted_output_eqn(0.0, &x, &u, &z),
        Err(PfError::Invariant { .. })
    ));
    assert!(matches!(
        model.input_eqn(0.0, &[0.0, 0.0], &[]),
        Err(PfError::Invariant { .. })
    ));
    assert!(matches!(
        model.event_state_eqn(&[0.0]),
        Err(PfError::Invariant { .. })
    ));
}

#[test]
fn threshold_is_reached_under_constant_load() {
    let model = WearModel::new();
    let u = model.input_eqn(0.0, &[1.0], &[]).unwrap();
    let mut x = model.initialize(&u, &model.output_vector()).unwrap();
    let mut t = 0.0;
    while !model.threshold_eqn(t, &x, &u).unwrap() {
        x = model.state_eqn(t, &x, &u, 1.0).unwrap();
        t += 1.0;
        assert!(t < 1000.0);
    }
    assert!((t - 80.0).abs() <= 1.0, "t = {t}");
    assert_eq!(model.event_state_eqn(x.as_slice()).unwrap(), vec![0.0]);
}

#[test]
fn models_work_as_shared_trait_objects() {
    let model: std::sync::Arc<dyn PrognosticsModel> = std::sync::Arc::new(WearModel::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let model = model.clone();
            std::thread::spawn(move || {
                let u = InputVector::from_vec(vec![i as f64]);
                let x = StateVector::from_vec(vec![1.0, 0.05]);
                model.threshold_eqn(0.0, &x, &u).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(!handle.join().unwrap());
    }
}

#[test]
fn process_noise_is_scaled_by_dt() {
    let model = WearModel::new();
    let x = StateVector::from_vec(vec![1.0, 0.0]);
    let u = InputVector::from_vec(vec![0.0]);
    let next = model.state_eqn_with_noise(0.0, &x, &u, &[0.5, -0.5], 2.0).unwrap();
    assert_eq!(next.as_slice(), &[2.0, -1.0]);
    assert!(model.state_eqn_with_noise(0.0, &x, &u, &[0.5], 2.0).is_err());
}

proptest! {
    #[test]
    fn threshold_is_pure(cap in 0.0_f64..1.5, res in 0.0_f64..1.0, load in 0.0_f64..10.0, t in 0.0_f64..1e4) {
        let model = WearModel::new();
        let x = StateVector::from_vec(vec![cap, res]);
        let u = InputVector::from_vec(vec![load]);
        let first = model.threshold_eqn(t, &x, &u).unwrap();
        let second = model.threshold_eqn(t, &x, &u).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn predicted_outputs_have_declared_length(cap in -1.0_f64..2.0, res in -1.0_f64..1.0, load in 0.0_f64..10.0) {
        let model = WearModel::new();
        let x = StateVector::from_vec(vec![cap, res]);
        let u = InputVector::from_vec(vec![load]);
        let z = model.output_eqn(0.0, &x, &u).unwrap();
        let p = model.predicted_output_eqn(0.0, &x, &u, &z).unwrap();
        prop_assert_eq!(p.len(), model.predicted_outputs().len());
    }

    #[test]
    fn mismatched_parameter_counts_never_succeed(n in 0_usize..6) {
        let model = WearModel::new();
        let params = vec![1.0; n];
        let result = model.input_eqn(0.0, &params, &[]);
        if n == model.input_parameter_count() {
            prop_assert_eq!(result.unwrap().len(), 1);
        } else {
            let is_precondition = matches!(result, Err(PfError::Precondition { .. }));
            prop_assert!(is_precondition);
        }
    }
}
