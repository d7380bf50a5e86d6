//! pf-results: prognostic result records and prognoser history files.

pub mod history;
pub mod types;

pub use history::{HistoryEntry, HistoryFile};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
