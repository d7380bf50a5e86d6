//! State estimates and state estimators.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use pf_config::ConfigMap;
use pf_core::{InputVector, OutputVector, PfError, StateVector};
use pf_model::{PrognosticsModel, SystemModel};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{SimError, SimResult};

/// Eigenvalues below `-PSD_TOL * max|λ|` mark a covariance as indefinite.
const PSD_TOL: f64 = 1e-9;

/// Mean state with its covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEstimate {
    pub mean: StateVector,
    pub covariance: DMatrix<f64>,
}

impl StateEstimate {
    pub fn new(mean: StateVector, covariance: DMatrix<f64>) -> SimResult<Self> {
        let n = mean.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(SimError::InvalidArg {
                what: format!(
                    "covariance is {}x{} for a state of size {n}",
                    covariance.nrows(),
                    covariance.ncols()
                ),
            });
        }
        Ok(Self { mean, covariance })
    }

    /// Estimate with no uncertainty.
    pub fn certain(mean: StateVector) -> Self {
        let n = mean.len();
        Self {
            mean,
            covariance: DMatrix::zeros(n, n),
        }
    }

    pub fn with_variances(mean: StateVector, variances: &[f64]) -> SimResult<Self> {
        PfError::check_len("variances", mean.len(), variances.len())?;
        let covariance = DMatrix::from_diagonal(&DVector::from_column_slice(variances));
        Self::new(mean, covariance)
    }

    pub fn std_dev(&self, index: usize) -> SimResult<f64> {
        if index >= self.mean.len() {
            return Err(PfError::IndexOob {
                what: "state",
                index,
                len: self.mean.len(),
            }
            .into());
        }
        Ok(self.covariance[(index, index)].max(0.0).sqrt())
    }

    /// Factor the covariance for drawing samples.
    pub fn sampler(&self) -> SimResult<StateSampler> {
        let mean = DVector::from_column_slice(self.mean.as_slice());
        if self.covariance.iter().all(|c| *c == 0.0) {
            return Ok(StateSampler { mean, factor: None });
        }
        if self.covariance.iter().any(|c| !c.is_finite()) {
            return Err(SimError::Numeric {
                what: "covariance has non-finite entries".to_string(),
            });
        }

        // Cholesky for the positive definite case, eigen decomposition when
        // some directions carry no variance.
        if let Some(chol) = self.covariance.clone().cholesky() {
            return Ok(StateSampler {
                mean,
                factor: Some(chol.l()),
            });
        }
        let symmetric = (&self.covariance + self.covariance.transpose()) * 0.5;
        let eigen = SymmetricEigen::new(symmetric);
        let scale = eigen.eigenvalues.amax();
        if eigen.eigenvalues.iter().any(|l| *l < -PSD_TOL * scale) {
            return Err(SimError::Numeric {
                what: "covariance is not positive semi-definite".to_string(),
            });
        }
        let roots = eigen.eigenvalues.map(|l| l.max(0.0).sqrt());
        Ok(StateSampler {
            mean,
            factor: Some(eigen.eigenvectors * DMatrix::from_diagonal(&roots)),
        })
    }
}

/// Draws states from a Gaussian `N(mean, L Lᵀ)`.
#[derive(Debug, Clone)]
pub struct StateSampler {
    mean: DVector<f64>,
    factor: Option<DMatrix<f64>>,
}

impl StateSampler {
    pub fn sample(&self, rng: &mut dyn RngCore) -> StateVector {
        let x = match &self.factor {
            None => self.mean.clone(),
            Some(l) => {
                let z = DVector::from_fn(self.mean.len(), |_, _| {
                    let v: f64 = StandardNormal.sample(&mut *rng);
                    v
                });
                &self.mean + l * z
            }
        };
        StateVector::from_vec(x.as_slice().to_vec())
    }
}

/// Tracks the state of a monitored system from inputs and outputs.
pub trait StateEstimator: Send {
    fn initialize(&mut self, t0: f64, x0: StateVector) -> SimResult<()>;

    fn step(&mut self, t: f64, u: &InputVector, z: &OutputVector) -> SimResult<()>;

    fn is_initialized(&self) -> bool;

    fn state_estimate(&self) -> SimResult<StateEstimate>;
}

/// Propagates the state through the model without measurement correction.
///
/// Covariance grows by `processNoise * dt` along the diagonal each step.
pub struct OpenLoopEstimator {
    model: Arc<dyn PrognosticsModel>,
    process_noise: Vec<f64>,
    last_time: f64,
    estimate: Option<StateEstimate>,
}

impl OpenLoopEstimator {
    pub fn new(model: Arc<dyn PrognosticsModel>) -> Self {
        let process_noise = vec![0.0; model.state_size()];
        Self {
            model,
            process_noise,
            last_time: 0.0,
            estimate: None,
        }
    }

    pub fn with_process_noise(mut self, process_noise: Vec<f64>) -> SimResult<Self> {
        PfError::check_len("process noise", self.model.state_size(), process_noise.len())?;
        if process_noise.iter().any(|q| !(*q >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "process noise variances must be non-negative".to_string(),
            });
        }
        self.process_noise = process_noise;
        Ok(self)
    }

    /// Reads `Model.processNoise` when present.
    pub fn from_config(model: Arc<dyn PrognosticsModel>, config: &ConfigMap) -> SimResult<Self> {
        let estimator = Self::new(model);
        if config.includes("Model.processNoise") {
            estimator.with_process_noise(config.get_f64_list("Model.processNoise")?)
        } else {
            Ok(estimator)
        }
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }
}

impl StateEstimator for OpenLoopEstimator {
    fn initialize(&mut self, t0: f64, x0: StateVector) -> SimResult<()> {
        x0.ensure_len(self.model.state_size())?;
        self.last_time = t0;
        self.estimate = Some(StateEstimate::certain(x0));
        Ok(())
    }

    fn step(&mut self, t: f64, u: &InputVector, z: &OutputVector) -> SimResult<()> {
        z.ensure_len(self.model.output_names().len())?;
        let estimate = self.estimate.as_mut().ok_or_else(|| SimError::InvalidArg {
            what: "estimator stepped before initialization".to_string(),
        })?;
        let dt = t - self.last_time;
        if !(dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: format!("time must advance (last {}, got {t})", self.last_time),
            });
        }

        estimate.mean = self.model.state_eqn(self.last_time, &estimate.mean, u, dt)?;
        for (i, q) in self.process_noise.iter().enumerate() {
            estimate.covariance[(i, i)] += q * dt;
        }
        self.last_time = t;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.estimate.is_some()
    }

    fn state_estimate(&self) -> SimResult<StateEstimate> {
        self.estimate.clone().ok_or_else(|| SimError::InvalidArg {
            what: "estimator has not been initialized".to_string(),
        })
    }
}
