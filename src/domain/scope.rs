// ============================================================
// Layer 3 — Variable Scope
// ============================================================
// Named storage for persistable engine variables: streaming
// metric accumulators (AUC statistics and the like) that keep
// their value from one batch execution to the next.
//
// The scope is owned by the driver and handed to the engine on
// every load/run call. The runner only ever zeroes and reads
// variables by name.

use std::collections::HashMap;

use crate::domain::tensor::HostTensor;

#[derive(Debug, Default, Clone)]
pub struct Scope {
    vars: HashMap<String, HostTensor>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable, None if it was never created
    pub fn var(&self, name: &str) -> Option<&HostTensor> {
        self.vars.get(name)
    }

    /// Make sure `name` exists with `shape`. An existing variable of the
    /// same shape keeps its value; a missing one, or one left behind with
    /// another shape by a previously loaded program, becomes zeros.
    pub fn declare(&mut self, name: &str, shape: &[usize]) -> &mut HostTensor {
        let tensor = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| HostTensor::zeros(shape));
        if tensor.shape != shape {
            *tensor = HostTensor::zeros(shape);
        }
        tensor
    }

    pub fn set(&mut self, name: impl Into<String>, value: HostTensor) {
        self.vars.insert(name.into(), value);
    }

    /// Replace a variable with zeros of its current shape.
    /// Returns false (and does nothing) when the variable does not exist.
    pub fn reset_to_zero(&mut self, name: &str) -> bool {
        match self.vars.get_mut(name) {
            Some(tensor) => {
                *tensor = HostTensor::zeros(&tensor.shape);
                true
            }
            None => false,
        }
    }

    /// Copy of a variable's current value
    pub fn read(&self, name: &str) -> Option<HostTensor> {
        self.vars.get(name).cloned()
    }
}
