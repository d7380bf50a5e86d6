//! Load estimators: the future operating conditions fed to the input equation.

use std::collections::VecDeque;

use pf_config::ConfigMap;
use pf_core::ensure_all_finite;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{SimError, SimResult};

/// Supplies load estimates for prediction.
///
/// `estimate_load` returns the expected load; `sample_load` draws one
/// realisation when the estimator carries uncertainty.
pub trait LoadEstimator: Send + Sync {
    fn estimate_load(&self, t: f64) -> SimResult<Vec<f64>>;

    fn sample_load(&self, t: f64, _rng: &mut dyn RngCore) -> SimResult<Vec<f64>> {
        self.estimate_load(t)
    }

    /// Whether observed loads can be fed back with [`LoadEstimator::add_load`].
    fn can_add_load(&self) -> bool {
        false
    }

    fn add_load(&mut self, _load: &[f64]) -> SimResult<()> {
        Err(SimError::InvalidArg {
            what: "this load estimator does not accept observed loads".to_string(),
        })
    }
}

/// Fixed load, optionally with Gaussian spread per element.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstLoadEstimator {
    loading: Vec<f64>,
    std_dev: Vec<f64>,
}

impl ConstLoadEstimator {
    pub fn new(loading: Vec<f64>) -> SimResult<Self> {
        if loading.is_empty() {
            return Err(SimError::InvalidArg {
                what: "loading must not be empty".to_string(),
            });
        }
        ensure_all_finite(&loading, "loading")?;
        Ok(Self {
            loading,
            std_dev: Vec::new(),
        })
    }

    pub fn with_std_dev(mut self, std_dev: Vec<f64>) -> SimResult<Self> {
        if std_dev.len() != self.loading.len() {
            return Err(SimError::InvalidArg {
                what: format!(
                    "stdDev has {} values for {} loads",
                    std_dev.len(),
                    self.loading.len()
                ),
            });
        }
        if std_dev.iter().any(|s| !(*s >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "stdDev values must be non-negative".to_string(),
            });
        }
        self.std_dev = std_dev;
        Ok(self)
    }

    /// `LoadEstimator.loading` (required), `LoadEstimator.stdDev` (optional).
    pub fn from_config(config: &ConfigMap) -> SimResult<Self> {
        let estimator = Self::new(config.get_f64_list("LoadEstimator.loading")?)?;
        if config.includes("LoadEstimator.stdDev") {
            estimator.with_std_dev(config.get_f64_list("LoadEstimator.stdDev")?)
        } else {
            Ok(estimator)
        }
    }
}

impl LoadEstimator for ConstLoadEstimator {
    fn estimate_load(&self, _t: f64) -> SimResult<Vec<f64>> {
        Ok(self.loading.clone())
    }

    fn sample_load(&self, t: f64, rng: &mut dyn RngCore) -> SimResult<Vec<f64>> {
        if self.std_dev.is_empty() {
            return self.estimate_load(t);
        }
        Ok(self
            .loading
            .iter()
            .zip(&self.std_dev)
            .map(|(mean, sd)| {
                let n: f64 = StandardNormal.sample(&mut *rng);
                mean + sd * n
            })
            .collect())
    }
}

/// Average of the most recent `window` observed loads.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageLoadEstimator {
    window: usize,
    buffer: VecDeque<Vec<f64>>,
}

pub const DEFAULT_WINDOW: usize = 10;

impl MovingAverageLoadEstimator {
    pub fn new(window: usize) -> SimResult<Self> {
        if window == 0 {
            return Err(SimError::InvalidArg {
                what: "window must be positive".to_string(),
            });
        }
        Ok(Self {
            window,
            buffer: VecDeque::with_capacity(window),
        })
    }

    /// `LoadEstimator.window` (default 10); `LoadEstimator.loading`, if
    /// present, seeds the window.
    pub fn from_config(config: &ConfigMap) -> SimResult<Self> {
        let mut estimator = Self::new(config.usize_or("LoadEstimator.window", DEFAULT_WINDOW)?)?;
        if config.includes("LoadEstimator.loading") {
            estimator.add_load(&config.get_f64_list("LoadEstimator.loading")?)?;
        }
        Ok(estimator)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl LoadEstimator for MovingAverageLoadEstimator {
    fn estimate_load(&self, _t: f64) -> SimResult<Vec<f64>> {
        let first = self.buffer.front().ok_or_else(|| SimError::InvalidArg {
            what: "no load has been observed yet".to_string(),
        })?;
        let mut sum = vec![0.0; first.len()];
        for load in &self.buffer {
            for (s, v) in sum.iter_mut().zip(load) {
                *s += v;
            }
        }
        let count = self.buffer.len() as f64;
        Ok(sum.into_iter().map(|s| s / count).collect())
    }

    fn can_add_load(&self) -> bool {
        true
    }

    fn add_load(&mut self, load: &[f64]) -> SimResult<()> {
        ensure_all_finite(load, "observed load")?;
        if let Some(first) = self.buffer.front()
            && first.len() != load.len()
        {
            return Err(SimError::InvalidArg {
                what: format!(
                    "observed load has {} values, expected {}",
                    load.len(),
                    first.len()
                ),
            });
        }
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back(load.to_vec());
        Ok(())
    }
}

/// Build the estimator named by `Predictor.loadEstimator` (default `const`).
pub fn load_estimator_from_config(config: &ConfigMap) -> SimResult<Box<dyn LoadEstimator>> {
    match config.str_or("Predictor.loadEstimator", "const")? {
        "const" => Ok(Box::new(ConstLoadEstimator::from_config(config)?)),
        "movingAverage" => Ok(Box::new(MovingAverageLoadEstimator::from_config(config)?)),
        other => Err(SimError::InvalidArg {
            what: format!("unknown load estimator '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn const_estimator_returns_loading() {
        let est = ConstLoadEstimator::new(vec![8.0]).unwrap();
        assert_eq!(est.estimate_load(0.0).unwrap(), vec![8.0]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(est.sample_load(10.0, &mut rng).unwrap(), vec![8.0]);
        assert!(!est.can_add_load());
    }

    #[test]
    fn const_estimator_samples_spread() {
        let est = ConstLoadEstimator::new(vec![8.0])
            .unwrap()
            .with_std_dev(vec![0.5])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<f64> = (0..200)
            .map(|_| est.sample_load(0.0, &mut rng).unwrap()[0])
            .collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 8.0).abs() < 0.2, "mean = {mean}");
        assert!(samples.iter().any(|s| (s - 8.0).abs() > 1e-6));
    }

    #[test]
    fn const_estimator_validation() {
        assert!(ConstLoadEstimator::new(vec![]).is_err());
        assert!(matches!(
            ConstLoadEstimator::new(vec![f64::NAN]),
            Err(SimError::Model(_))
        ));
        let est = ConstLoadEstimator::new(vec![1.0, 2.0]).unwrap();
        assert!(est.clone().with_std_dev(vec![0.1]).is_err());
        assert!(est.with_std_dev(vec![0.1, -1.0]).is_err());
    }

    #[test]
    fn moving_average_over_window() {
        let mut est = MovingAverageLoadEstimator::new(3).unwrap();
        assert!(est.estimate_load(0.0).is_err());
        for load in [1.0, 2.0, 3.0, 4.0] {
            est.add_load(&[load]).unwrap();
        }
        assert_eq!(est.len(), 3);
        assert_eq!(est.estimate_load(0.0).unwrap(), vec![3.0]);
        assert!(est.add_load(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn selection_from_config() {
        let mut config = ConfigMap::new();
        config.set("LoadEstimator.loading", "8");
        let est = load_estimator_from_config(&config).unwrap();
        assert_eq!(est.estimate_load(0.0).unwrap(), vec![8.0]);

        config.set("Predictor.loadEstimator", "movingAverage");
        config.set("LoadEstimator.window", "5");
        let est = load_estimator_from_config(&config).unwrap();
        assert!(est.can_add_load());
        assert_eq!(est.estimate_load(0.0).unwrap(), vec![8.0]);

        config.set("Predictor.loadEstimator", "exponential");
        assert!(load_estimator_from_config(&config).is_err());
    }
}
