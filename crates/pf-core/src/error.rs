use thiserror::Error;

pub type PfResult<T> = Result<T, PfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Construction error: {what}")]
    Construction { what: String },

    #[error("Precondition violated: {what} (expected={expected}, actual={actual})")]
    Precondition {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Unknown name '{name}' in {context}")]
    UnknownName { name: String, context: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

impl PfError {
    /// Length check used at equation boundaries.
    pub fn check_len(what: &'static str, expected: usize, actual: usize) -> PfResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(PfError::Precondition {
                what,
                expected,
                actual,
            })
        }
    }
}
