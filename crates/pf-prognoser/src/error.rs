//! Error types for prognosers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrognoserError {
    #[error("Configuration error: {0}")]
    Config(#[from] pf_config::ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] pf_core::PfError),

    #[error("Prediction error: {0}")]
    Sim(#[from] pf_sim::SimError),

    #[error("Results error: {0}")]
    Results(#[from] pf_results::ResultsError),

    #[error("Invalid tag '{entry}': expected local:global")]
    InvalidTag { entry: String },

    #[error("Unknown sensor '{name}'")]
    UnknownSensor { name: String },

    #[error("No data for '{name}' (tag {tag})")]
    MissingData { name: String, tag: String },

    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Invalid result: {what}")]
    InvalidResult { what: String },

    #[error("Unknown prognoser type '{name}'")]
    UnknownPrognoser { name: String },

    #[error("Prognoser thread panicked")]
    ThreadPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PrognoserResult<T> = Result<T, PrognoserError>;
