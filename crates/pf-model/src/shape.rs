//! Shape descriptors: vector sizes and name lists fixed at construction.

use pf_core::{
    InputVector, NameList, OutputVector, PfError, PfResult, PredictedOutputVector, StateVector,
};

/// Event name used when a model does not declare its own.
pub const DEFAULT_EVENT: &str = "EOL";

/// Shape of the base dynamical system.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelShape {
    state_size: usize,
    inputs: NameList,
    outputs: NameList,
}

impl ModelShape {
    pub fn new<I, O, S, T>(state_size: usize, inputs: I, outputs: O) -> PfResult<Self>
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        if state_size == 0 {
            return Err(PfError::Construction {
                what: "state size must be positive".to_string(),
            });
        }
        let inputs = NameList::new(inputs, "inputs")?;
        if inputs.is_empty() {
            return Err(PfError::Construction {
                what: "at least one input name is required".to_string(),
            });
        }
        let outputs = NameList::new(outputs, "outputs")?;
        if outputs.is_empty() {
            return Err(PfError::Construction {
                what: "at least one output name is required".to_string(),
            });
        }
        Ok(Self {
            state_size,
            inputs,
            outputs,
        })
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn inputs(&self) -> &NameList {
        &self.inputs
    }

    pub fn outputs(&self) -> &NameList {
        &self.outputs
    }

    pub fn state_vector(&self) -> StateVector {
        StateVector::zeros(self.state_size)
    }

    pub fn input_vector(&self) -> InputVector {
        InputVector::zeros(self.inputs.len())
    }

    pub fn output_vector(&self) -> OutputVector {
        OutputVector::zeros(self.outputs.len())
    }
}

/// Shape of a prognostics model: the base shape plus predicted outputs,
/// input parameter count and event names.
///
/// Immutable once built; a model holds one for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct PrognosticsShape {
    base: ModelShape,
    predicted_outputs: NameList,
    input_parameter_count: usize,
    events: NameList,
}

impl PrognosticsShape {
    /// Build a shape whose input parameter count equals the number of inputs.
    pub fn new<I, O, P, S, T, U>(
        state_size: usize,
        inputs: I,
        outputs: O,
        predicted_outputs: P,
    ) -> PfResult<Self>
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        P: IntoIterator<Item = U>,
        S: Into<String>,
        T: Into<String>,
        U: Into<String>,
    {
        let base = ModelShape::new(state_size, inputs, outputs)?;
        let predicted_outputs = NameList::new(predicted_outputs, "predicted outputs")?;
        let input_parameter_count = base.inputs().len();
        Ok(Self {
            base,
            predicted_outputs,
            input_parameter_count,
            events: NameList::new([DEFAULT_EVENT], "events")?,
        })
    }

    /// Override the number of parameters consumed by the input equation.
    pub fn with_input_parameter_count(mut self, count: usize) -> Self {
        self.input_parameter_count = count;
        self
    }

    /// Declare the events reported by the event state equation.
    pub fn with_events<E, S>(mut self, events: E) -> PfResult<Self>
    where
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = NameList::new(events, "events")?;
        if events.is_empty() {
            return Err(PfError::Construction {
                what: "at least one event name is required".to_string(),
            });
        }
        self.events = events;
        Ok(self)
    }

    pub fn base(&self) -> &ModelShape {
        &self.base
    }

    pub fn input_parameter_count(&self) -> usize {
        self.input_parameter_count
    }

    pub fn predicted_outputs(&self) -> &NameList {
        &self.predicted_outputs
    }

    /// A fresh zero vector sized to the predicted outputs.
    pub fn predicted_output_vector(&self) -> PredictedOutputVector {
        PredictedOutputVector::zeros(self.predicted_outputs.len())
    }

    pub fn events(&self) -> &NameList {
        &self.events
    }
}
