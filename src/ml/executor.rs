// ============================================================
// Layer 5 — Program Executor (Burn)
// ============================================================
// Interprets a ProgramDesc op by op on a Burn backend.
//
// All values are held as rank-1 Burn tensors with the logical
// shape tracked next to them. The ops are all elementwise or
// full reductions, so the flat layout is enough.
//
// Device selection mirrors the run config:
//   use_gpu = 1 → Wgpu on discrete GPU 0
//   use_gpu = 0 → NdArray on the CPU
//
// Persistable variables are read from the caller's Scope at the
// start of each op that uses them and written back straight
// away. Nothing survives between `run` calls except what is in
// the Scope.

use anyhow::Result;
use burn::{
    backend::{
        ndarray::NdArrayDevice,
        wgpu::WgpuDevice,
        NdArray, Wgpu,
    },
    prelude::*,
    tensor::ElementConversion,
};
use std::{collections::HashMap, path::Path};

use crate::domain::error::InferError;
use crate::domain::scope::Scope;
use crate::domain::tensor::{Batch, HostTensor};
use crate::domain::traits::{InferenceEngine, LoadedModel};
use crate::ml::program::{OpDesc, ProgramDesc};

// ─── Place ────────────────────────────────────────────────────────────────────
/// Where the program executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Cpu,
    Gpu(usize),
}

impl Place {
    pub fn from_use_gpu(use_gpu: bool) -> Self {
        if use_gpu {
            Place::Gpu(0)
        } else {
            Place::Cpu
        }
    }
}

// ─── DeviceTensor ─────────────────────────────────────────────────────────────
/// Flat device tensor plus its logical shape
#[derive(Clone)]
struct DeviceTensor<B: Backend> {
    data: Tensor<B, 1>,
    shape: Vec<usize>,
}

impl<B: Backend> DeviceTensor<B> {
    fn upload(host: &HostTensor, device: &B::Device) -> Self {
        Self {
            data: Tensor::<B, 1>::from_floats(host.values.as_slice(), device),
            shape: host.shape.clone(),
        }
    }

    fn download(&self) -> Result<HostTensor> {
        let values = self
            .data
            .clone()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| InferError::Execution(format!("tensor readback failed: {e:?}")))?;
        Ok(HostTensor { shape: self.shape.clone(), values })
    }

    fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Value of a single-element tensor
    fn scalar(&self) -> f32 {
        self.data.clone().sum().into_scalar().elem::<f32>()
    }
}

// ─── BurnExecutor ─────────────────────────────────────────────────────────────
pub struct BurnExecutor<B: Backend> {
    device: B::Device,
}

impl<B: Backend> BurnExecutor<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn eval_op(
        &self,
        op: &OpDesc,
        env: &mut HashMap<String, DeviceTensor<B>>,
        scope: &mut Scope,
    ) -> Result<()> {
        let value = match op {
            OpDesc::Identity { x, .. } => lookup(env, x)?.clone(),

            OpDesc::Scale { x, scale, bias, .. } => {
                let x = lookup(env, x)?;
                DeviceTensor {
                    data: x.data.clone().mul_scalar(*scale).add_scalar(*bias),
                    shape: x.shape.clone(),
                }
            }

            OpDesc::ElementwiseAdd { x, y, .. } => {
                let (x, y) = (lookup(env, x)?, lookup(env, y)?);
                binary(x, y, "elementwise_add", |a, b| a + b, |a, s| a.add_scalar(s))?
            }

            OpDesc::ElementwiseMul { x, y, .. } => {
                let (x, y) = (lookup(env, x)?, lookup(env, y)?);
                binary(x, y, "elementwise_mul", |a, b| a * b, |a, s| a.mul_scalar(s))?
            }

            OpDesc::Sigmoid { x, .. } => {
                let x = lookup(env, x)?;
                DeviceTensor {
                    data: burn::tensor::activation::sigmoid(x.data.clone()),
                    shape: x.shape.clone(),
                }
            }

            OpDesc::ReduceMean { x, .. } => {
                let x = lookup(env, x)?;
                if x.numel() == 0 {
                    return Err(InferError::Execution("reduce_mean of an empty tensor".into()).into());
                }
                DeviceTensor { data: x.data.clone().mean(), shape: vec![1] }
            }

            OpDesc::Accumulate { x, var, .. } => {
                let x = lookup(env, x)?;
                let state = scope.var(var).ok_or_else(|| {
                    InferError::Execution(format!("persistable '{var}' is not in scope"))
                })?;
                let state = DeviceTensor::<B>::upload(state, &self.device);

                let updated = if state.shape == x.shape {
                    state.data + x.data.clone()
                } else {
                    let total = x.data.clone().sum().into_scalar().elem::<f32>();
                    state.data.add_scalar(total)
                };
                let updated = DeviceTensor { data: updated, shape: state.shape };
                scope.set(var.clone(), updated.download()?);
                env.insert(var.clone(), updated.clone());
                updated
            }
        };

        env.insert(op.output().to_string(), value);
        Ok(())
    }
}

impl<B: Backend> InferenceEngine for BurnExecutor<B> {
    type Program = ProgramDesc;

    fn load_inference_model(
        &self,
        dir: &Path,
        scope: &mut Scope,
    ) -> Result<LoadedModel<ProgramDesc>> {
        let program = ProgramDesc::load_from_dir(dir)?;
        for (name, shape) in &program.persistables {
            scope.declare(name, shape);
        }
        tracing::debug!(
            "Loaded program from '{}': {} op(s), feed={:?}, fetch={:?}",
            dir.display(),
            program.ops.len(),
            program.feed,
            program.fetch
        );
        Ok(LoadedModel {
            feed_names: program.feed.clone(),
            fetch_names: program.fetch.clone(),
            program,
        })
    }

    fn run(
        &self,
        model: &LoadedModel<ProgramDesc>,
        feed: &Batch,
        scope: &mut Scope,
    ) -> Result<Vec<HostTensor>> {
        let program = &model.program;
        let mut env: HashMap<String, DeviceTensor<B>> = HashMap::new();

        for name in &model.feed_names {
            let host = feed.get(name).ok_or_else(|| {
                InferError::Execution(format!("feed variable '{name}' missing from batch"))
            })?;
            env.insert(name.clone(), DeviceTensor::upload(host, &self.device));
        }
        for (name, param) in &program.params {
            let host = HostTensor { shape: param.shape.clone(), values: param.values.clone() };
            env.insert(name.clone(), DeviceTensor::upload(&host, &self.device));
        }
        for name in program.persistables.keys() {
            if let Some(host) = scope.var(name) {
                env.insert(name.clone(), DeviceTensor::upload(host, &self.device));
            }
        }

        for op in &program.ops {
            self.eval_op(op, &mut env, scope)?;
        }

        model
            .fetch_names
            .iter()
            .map(|name| lookup(&env, name)?.download())
            .collect()
    }
}

fn lookup<'a, B: Backend>(
    env: &'a HashMap<String, DeviceTensor<B>>,
    name: &str,
) -> Result<&'a DeviceTensor<B>> {
    env.get(name)
        .ok_or_else(|| InferError::Execution(format!("variable '{name}' is not defined")).into())
}

/// Same-shape elementwise op, or scalar broadcast when `y` has one element.
fn binary<B: Backend>(
    x: &DeviceTensor<B>,
    y: &DeviceTensor<B>,
    op_name: &str,
    elementwise: impl Fn(Tensor<B, 1>, Tensor<B, 1>) -> Tensor<B, 1>,
    with_scalar: impl Fn(Tensor<B, 1>, f32) -> Tensor<B, 1>,
) -> Result<DeviceTensor<B>> {
    let data = if x.shape == y.shape {
        elementwise(x.data.clone(), y.data.clone())
    } else if y.numel() == 1 {
        with_scalar(x.data.clone(), y.scalar())
    } else {
        return Err(InferError::Execution(format!(
            "{op_name}: shapes {:?} and {:?} are not compatible",
            x.shape, y.shape
        ))
        .into());
    };
    Ok(DeviceTensor { data, shape: x.shape.clone() })
}

// ─── DeviceExecutor ───────────────────────────────────────────────────────────
/// Executor bound to the backend chosen by `Place`, so callers
/// outside this layer never name a Burn type.
pub enum DeviceExecutor {
    Cpu(BurnExecutor<NdArray>),
    Gpu(BurnExecutor<Wgpu>),
}

impl DeviceExecutor {
    pub fn for_place(place: Place) -> Self {
        match place {
            Place::Cpu => Self::Cpu(BurnExecutor::new(NdArrayDevice::Cpu)),
            Place::Gpu(index) => Self::Gpu(BurnExecutor::new(WgpuDevice::DiscreteGpu(index))),
        }
    }
}

impl InferenceEngine for DeviceExecutor {
    type Program = ProgramDesc;

    fn load_inference_model(
        &self,
        dir: &Path,
        scope: &mut Scope,
    ) -> Result<LoadedModel<ProgramDesc>> {
        match self {
            Self::Cpu(exe) => exe.load_inference_model(dir, scope),
            Self::Gpu(exe) => exe.load_inference_model(dir, scope),
        }
    }

    fn run(
        &self,
        model: &LoadedModel<ProgramDesc>,
        feed: &Batch,
        scope: &mut Scope,
    ) -> Result<Vec<HostTensor>> {
        match self {
            Self::Cpu(exe) => exe.run(model, feed, scope),
            Self::Gpu(exe) => exe.run(model, feed, scope),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::program::MODEL_FILENAME;
    use std::fs;
    use tempfile::tempdir;

    type TestBackend = NdArray;

    fn executor() -> BurnExecutor<TestBackend> {
        BurnExecutor::new(NdArrayDevice::Cpu)
    }

    fn feed_x(values: Vec<f32>) -> Batch {
        let mut batch = Batch::new();
        let len = values.len();
        batch.insert("x", HostTensor::new(vec![len, 1], values).unwrap());
        batch
    }

    fn load(json: &str, scope: &mut Scope) -> LoadedModel<ProgramDesc> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MODEL_FILENAME), json).unwrap();
        executor().load_inference_model(dir.path(), scope).unwrap()
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_identity_returns_feed() {
        let mut scope = Scope::new();
        let model = load(
            r#"{"feed":["x"],"fetch":["y"],"ops":[{"type":"identity","x":"x","out":"y"}]}"#,
            &mut scope,
        );
        let out = executor().run(&model, &feed_x(vec![1.0, 3.0]), &mut scope).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].shape, vec![2, 1]);
        assert_close(&out[0].values, &[1.0, 3.0]);
    }

    #[test]
    fn test_scale_mul_and_mean() {
        let mut scope = Scope::new();
        let model = load(
            r#"{
                "feed": ["x"],
                "fetch": ["h", "m"],
                "params": {"w": {"shape": [1], "values": [2.0]}},
                "ops": [
                    {"type": "elementwise_mul", "x": "x", "y": "w", "out": "a"},
                    {"type": "scale", "x": "a", "out": "h", "scale": 1.0, "bias": 1.0},
                    {"type": "reduce_mean", "x": "h", "out": "m"}
                ]
            }"#,
            &mut scope,
        );
        let out = executor().run(&model, &feed_x(vec![1.0, 2.0, 3.0]), &mut scope).unwrap();
        assert_close(&out[0].values, &[3.0, 5.0, 7.0]);
        assert_eq!(out[1].shape, vec![1]);
        assert_close(&out[1].values, &[5.0]);
    }

    #[test]
    fn test_sigmoid_of_zero_is_half() {
        let mut scope = Scope::new();
        let model = load(
            r#"{"feed":["x"],"fetch":["p"],"ops":[{"type":"sigmoid","x":"x","out":"p"}]}"#,
            &mut scope,
        );
        let out = executor().run(&model, &feed_x(vec![0.0]), &mut scope).unwrap();
        assert_close(&out[0].values, &[0.5]);
    }

    #[test]
    fn test_accumulate_persists_in_scope() {
        let mut scope = Scope::new();
        let model = load(
            r#"{
                "feed": ["x"],
                "fetch": ["s"],
                "persistables": {"_generated_var_0": [1]},
                "ops": [{"type": "accumulate", "x": "x", "var": "_generated_var_0", "out": "s"}]
            }"#,
            &mut scope,
        );
        assert_eq!(scope.read("_generated_var_0"), Some(HostTensor::zeros(&[1])));

        let exe = executor();
        exe.run(&model, &feed_x(vec![1.0, 2.0]), &mut scope).unwrap();
        let out = exe.run(&model, &feed_x(vec![4.0]), &mut scope).unwrap();

        assert_close(&out[0].values, &[7.0]);
        assert_close(&scope.read("_generated_var_0").unwrap().values, &[7.0]);
    }

    #[test]
    fn test_missing_feed_is_execution_error() {
        let mut scope = Scope::new();
        let model = load(
            r#"{"feed":["x"],"fetch":["x"],"ops":[]}"#,
            &mut scope,
        );
        let err = executor().run(&model, &Batch::new(), &mut scope).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InferError>(),
            Some(InferError::Execution(_))
        ));
    }

    #[test]
    fn test_incompatible_shapes_is_execution_error() {
        let mut scope = Scope::new();
        let model = load(
            r#"{
                "feed": ["x"],
                "fetch": ["y"],
                "params": {"w": {"shape": [3], "values": [1.0, 2.0, 3.0]}},
                "ops": [{"type": "elementwise_add", "x": "x", "y": "w", "out": "y"}]
            }"#,
            &mut scope,
        );
        let err = executor().run(&model, &feed_x(vec![1.0, 2.0]), &mut scope).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InferError>(),
            Some(InferError::Execution(_))
        ));
    }

    #[test]
    fn test_place_from_use_gpu() {
        assert_eq!(Place::from_use_gpu(true), Place::Gpu(0));
        assert_eq!(Place::from_use_gpu(false), Place::Cpu);
    }
}
