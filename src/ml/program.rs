// ============================================================
// Layer 5 — Serialized Inference Program
// ============================================================
// Every checkpoint directory holds one `__model__.json`: the
// pruned inference graph saved at the end of an epoch.
//
//   {
//     "feed":  ["x"],
//     "fetch": ["auc"],
//     "persistables": { "_generated_var_0": [1] },
//     "params": { "w": { "shape": [1], "values": [0.5] } },
//     "ops": [
//       { "type": "elementwise_mul", "x": "x", "y": "w", "out": "h" },
//       { "type": "sigmoid", "x": "h", "out": "p" },
//       { "type": "accumulate", "x": "p", "var": "_generated_var_0", "out": "auc" }
//     ]
//   }
//
// feed          — input variable names, filled from each batch
// fetch         — output variable names returned per batch
// persistables  — engine-managed state (metric accumulators)
//                 created zero-filled in the scope on load
// params        — trained weights, constant during inference
// ops           — executed in order; each writes one variable
//
// The file is validated on load: every op may only read names
// that are already defined (feed, param, persistable or an
// earlier op's output), and every fetch target must be defined.

use anyhow::Result;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use crate::domain::error::InferError;

pub const MODEL_FILENAME: &str = "__model__.json";

#[derive(Debug, Clone, Deserialize)]
pub struct ParamDesc {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpDesc {
    Identity {
        x: String,
        out: String,
    },
    Scale {
        x: String,
        out: String,
        #[serde(default = "default_scale")]
        scale: f32,
        #[serde(default)]
        bias: f32,
    },
    /// `y` may hold a single element, broadcast over `x`
    ElementwiseAdd {
        x: String,
        y: String,
        out: String,
    },
    /// `y` may hold a single element, broadcast over `x`
    ElementwiseMul {
        x: String,
        y: String,
        out: String,
    },
    Sigmoid {
        x: String,
        out: String,
    },
    /// Mean over all elements, output shape [1]
    ReduceMean {
        x: String,
        out: String,
    },
    /// var += x (same shape) or var += sum(x) (otherwise); out = var
    Accumulate {
        x: String,
        var: String,
        out: String,
    },
}

fn default_scale() -> f32 {
    1.0
}

impl OpDesc {
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Identity { x, .. }
            | Self::Scale { x, .. }
            | Self::Sigmoid { x, .. }
            | Self::ReduceMean { x, .. } => vec![x.as_str()],
            Self::ElementwiseAdd { x, y, .. } | Self::ElementwiseMul { x, y, .. } => {
                vec![x.as_str(), y.as_str()]
            }
            Self::Accumulate { x, var, .. } => vec![x.as_str(), var.as_str()],
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Self::Identity { out, .. }
            | Self::Scale { out, .. }
            | Self::ElementwiseAdd { out, .. }
            | Self::ElementwiseMul { out, .. }
            | Self::Sigmoid { out, .. }
            | Self::ReduceMean { out, .. }
            | Self::Accumulate { out, .. } => out.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDesc {
    pub feed: Vec<String>,
    pub fetch: Vec<String>,
    #[serde(default)]
    pub persistables: BTreeMap<String, Vec<usize>>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamDesc>,
    pub ops: Vec<OpDesc>,
}

impl ProgramDesc {
    /// Read and validate `<dir>/__model__.json`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(MODEL_FILENAME);
        let text = fs::read_to_string(&path).map_err(|e| {
            InferError::Load(format!("cannot read '{}': {e}", path.display()))
        })?;
        let program: ProgramDesc = serde_json::from_str(&text).map_err(|e| {
            InferError::Load(format!("invalid program '{}': {e}", path.display()))
        })?;
        program.validate().map_err(|msg| {
            InferError::Load(format!("invalid program '{}': {msg}", path.display()))
        })?;
        Ok(program)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (name, p) in &self.params {
            if p.shape.iter().product::<usize>() != p.values.len() {
                return Err(format!(
                    "param '{name}' has {} value(s) for shape {:?}",
                    p.values.len(),
                    p.shape
                ));
            }
        }

        let mut defined: HashSet<&str> = self.feed.iter().map(String::as_str).collect();
        defined.extend(self.params.keys().map(String::as_str));
        defined.extend(self.persistables.keys().map(String::as_str));

        for (idx, op) in self.ops.iter().enumerate() {
            if let OpDesc::Accumulate { var, .. } = op {
                if !self.persistables.contains_key(var) {
                    return Err(format!("op #{idx} accumulates into undeclared persistable '{var}'"));
                }
            }
            for input in op.inputs() {
                if !defined.contains(input) {
                    return Err(format!("op #{idx} reads undefined variable '{input}'"));
                }
            }
            defined.insert(op.output());
        }

        for target in &self.fetch {
            if !defined.contains(target.as_str()) {
                return Err(format!("fetch target '{target}' is never produced"));
            }
        }
        Ok(())
    }
}
