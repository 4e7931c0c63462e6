// ============================================================
// Layer 3 — Host Tensor and Batch
// ============================================================
// A HostTensor is the only tensor type that crosses layer
// boundaries: a flat row-major f32 buffer plus its shape.
// Burn tensors are created from it inside the ml layer and
// read back into it before results leave that layer.
//
// A Batch is an ordered list of (feed name, tensor) pairs,
// produced by the reader and consumed by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense row-major f32 tensor living in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    /// Dimension sizes, outermost first
    pub shape: Vec<usize>,

    /// Row-major values, `shape.iter().product()` of them
    pub values: Vec<f32>,
}

impl HostTensor {
    /// Build a tensor from a shape and matching values.
    #[cfg(test)]
    /// Returns None if the element count disagrees with the shape.
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Option<Self> {
        if shape.iter().product::<usize>() != values.len() {
            return None;
        }
        Some(Self { shape, values })
    }

    /// A single-element tensor of shape [1]
    #[cfg(test)]
    pub fn scalar(value: f32) -> Self {
        Self { shape: vec![1], values: vec![value] }
    }

    /// Number of elements, `shape.iter().product()`
    #[cfg(test)]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Zero-filled tensor of the given shape
    pub fn zeros(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self { shape: shape.to_vec(), values: vec![0.0; len] }
    }
}

/// Printed numpy-style so progress lines stay compact: `[1 3]`
impl fmt::Display for HostTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

/// Declaration of one model input: its variable name and how many
/// values each example carries for it. Batches built for this slot
/// have shape [rows, dim].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSlot {
    pub name: String,
    #[serde(default = "default_dim")]
    pub dim: usize,
}

fn default_dim() -> usize {
    1
}

/// One mini-batch of named input tensors, in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    slots: Vec<(String, HostTensor)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named tensor. Duplicate names are kept; `get` returns the first.
    pub fn insert(&mut self, name: impl Into<String>, tensor: HostTensor) {
        self.slots.push((name.into(), tensor));
    }

    pub fn get(&self, name: &str) -> Option<&HostTensor> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}
