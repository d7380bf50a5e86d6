//! Error types for simulation and prediction.

use thiserror::Error;

/// Errors encountered while simulating or predicting.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Model error: {0}")]
    Model(#[from] pf_core::PfError),

    #[error("Configuration error: {0}")]
    Config(#[from] pf_config::ConfigError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SimResult<T> = Result<T, SimError>;
