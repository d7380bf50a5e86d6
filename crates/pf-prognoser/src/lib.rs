//! Prognoser lifecycle.
//!
//! Provides:
//! - The `Prognoser` trait with its step and validity hooks
//! - `CommonPrognoser`, which drives a prognoser on its own thread: history,
//!   tag lookup, periodic saves, start/pause/stop control
//! - Sensor data plumbing (`DataSource`, `DataStore`, `SensorView`)
//! - `EmptyPrognoser` and `ModelBasedPrognoser`, registered in `PrognoserFactory`

pub mod common;
pub mod data;
pub mod empty;
pub mod error;
pub mod factory;
pub mod model_based;
pub mod prognoser;

pub use common::{CommonPrognoser, CommonSettings, LifecycleState, PrognoserHandle};
pub use data::{DataSource, DataStore, Datum, SensorView, TagMap};
pub use empty::EmptyPrognoser;
pub use error::{PrognoserError, PrognoserResult};
pub use factory::{PrognoserConstructor, PrognoserFactory};
pub use model_based::ModelBasedPrognoser;
pub use prognoser::Prognoser;
