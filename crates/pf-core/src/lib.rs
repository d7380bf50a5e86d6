//! pf-core: stable foundation for progflow.
//!
//! Contains:
//! - vector (fixed-length numeric vectors tagged with their role)
//! - names (ordered, unique name lists that give vectors symbolic access)
//! - numeric (Real + finiteness checks + unit clamping)
//! - error (shared error types)

pub mod error;
pub mod names;
pub mod numeric;
pub mod vector;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PfError, PfResult};
pub use names::NameList;
pub use numeric::*;
pub use vector::{
    Input, InputVector, NamedVector, Output, OutputVector, PredictedOutput,
    PredictedOutputVector, State, StateVector, VectorRole,
};
