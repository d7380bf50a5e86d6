//! Simulation and prediction over prognostics models.
//!
//! Provides:
//! - Fixed-step simulation of a model until its threshold is reached
//! - Load estimators that supply future operating conditions
//! - State estimates (mean + covariance) and an open-loop estimator
//! - Monte Carlo time-of-event prediction

pub mod error;
pub mod estimator;
pub mod load;
pub mod predictor;
pub mod sim;

pub use error::{SimError, SimResult};
pub use estimator::{OpenLoopEstimator, StateEstimate, StateEstimator, StateSampler};
pub use load::{
    ConstLoadEstimator, LoadEstimator, MovingAverageLoadEstimator, load_estimator_from_config,
};
pub use predictor::{EventPrediction, MonteCarloPredictor, Prediction, TrajectoryPrediction};
pub use sim::{SimOptions, SimRecord, simulate_to_threshold};
