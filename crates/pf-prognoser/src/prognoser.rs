//! The prognoser trait driven by [`crate::CommonPrognoser`].

use pf_results::ProgData;

use crate::data::SensorView;
use crate::error::PrognoserResult;

/// A component prognoser.
///
/// Each started loop runs `check_input_validity`, then `step` when
/// `is_enough_data` holds, then `check_result_validity`. An error from any of
/// them skips the rest of that loop.
pub trait Prognoser: Send {
    /// Monitor and predict from the current sensor values.
    fn step(&mut self, sensors: &SensorView<'_>) -> PrognoserResult<()>;

    fn check_input_validity(&mut self, _sensors: &SensorView<'_>) -> PrognoserResult<()> {
        Ok(())
    }

    fn is_enough_data(&self, _sensors: &SensorView<'_>) -> bool {
        true
    }

    fn check_result_validity(&mut self) -> PrognoserResult<()> {
        Ok(())
    }

    /// Restore from the last saved results.
    fn set_history(&mut self, _last: &ProgData) -> PrognoserResult<()> {
        Ok(())
    }

    fn results(&self) -> &ProgData;
}
