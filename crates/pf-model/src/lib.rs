//! Model contracts for prognostics.
//!
//! Provides:
//! - `SystemModel`: the base dynamical system (state transition + outputs)
//! - `PrognosticsModel`: threshold, event state, input derivation and
//!   predicted output equations on top of a `SystemModel`
//! - Shape descriptors that fix vector lengths and names at construction
//! - A lumped electrochemistry battery model
//! - A name-keyed model factory

pub mod battery;
pub mod factory;
pub mod prognostics;
pub mod shape;
pub mod system;

pub use battery::{Battery, BatteryParameters};
pub use factory::{ModelConstructor, ModelFactory};
pub use prognostics::PrognosticsModel;
pub use shape::{DEFAULT_EVENT, ModelShape, PrognosticsShape};
pub use system::SystemModel;
