// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Evaluates one checkpoint:
//
//   1. load the saved program and its feed / fetch names
//   2. zero the metric accumulators in the scope
//   3. run every batch of a fresh reader pass through the program
//   4. keep every fetched tensor of every batch
//   5. log progress every `print_interval` batches
//   6. return the mean over all collected values
//
// Step 4 keeps ALL fetch targets, not only a designated metric
// output, so with several fetch targets the returned mean mixes
// them. This is probably a defect, but previously recorded
// result files depend on it; do not narrow it without agreeing
// on what the metric should be.
//
// Errors from the engine or the reader are not caught: the
// checkpoint (and with it the run) fails.

use anyhow::{Context, Result};

use crate::domain::checkpoint::CheckpointRef;
use crate::domain::scope::Scope;
use crate::domain::tensor::HostTensor;
use crate::domain::traits::{BatchReader, InferenceEngine};

pub struct Inferencer<'a, E: InferenceEngine, R: BatchReader + ?Sized> {
    engine: &'a E,
    reader: &'a R,
    print_interval: usize,
    accumulator_vars: &'a [String],
}

impl<'a, E: InferenceEngine, R: BatchReader + ?Sized> Inferencer<'a, E, R> {
    pub fn new(
        engine: &'a E,
        reader: &'a R,
        print_interval: usize,
        accumulator_vars: &'a [String],
    ) -> Self {
        Self {
            engine,
            reader,
            print_interval: print_interval.max(1),
            accumulator_vars,
        }
    }

    /// Run the whole evaluation set through one checkpoint and return
    /// the mean of everything it fetched.
    pub fn run_infer(&self, ckpt: &CheckpointRef, scope: &mut Scope) -> Result<f64> {
        let model = self
            .engine
            .load_inference_model(&ckpt.path, scope)
            .with_context(|| format!("loading checkpoint '{}'", ckpt.path.display()))?;

        reset_accumulators(scope, self.accumulator_vars);

        let mut infer_res: Vec<HostTensor> = Vec::new();
        for (idx, batch) in self.reader.batches().enumerate() {
            let batch_id = idx + 1;
            let batch = batch?;
            let results = self
                .engine
                .run(&model, &batch, scope)
                .with_context(|| format!("model {}, batch {batch_id}", ckpt.name))?;

            if let Some(metrics) = progress_line(batch_id, self.print_interval, &results) {
                tracing::info!("Model: {}, Batch: {}, {}", ckpt.name, batch_id, metrics);
            }

            infer_res.extend(results);
        }

        Ok(mean_of(&infer_res))
    }
}

/// Fetched values to log for `batch_id` (counted from 1), or None
/// between every `print_interval`-th batch.
pub fn progress_line(batch_id: usize, print_interval: usize, results: &[HostTensor]) -> Option<String> {
    if batch_id % print_interval.max(1) != 0 {
        return None;
    }
    Some(results.iter().map(|t| format!("Infer res: {t}, ")).collect())
}

/// Zero every named accumulator that exists in the scope; absent names are skipped.
pub fn reset_accumulators(scope: &mut Scope, names: &[String]) {
    for name in names {
        if scope.reset_to_zero(name) {
            tracing::info!("AUC Reset To Zero: {}", name);
            if let Some(value) = scope.read(name) {
                tracing::debug!("{} = {}", name, value);
            }
        }
    }
}

/// Arithmetic mean over every element of every tensor. NaN when there are none.
pub fn mean_of(tensors: &[HostTensor]) -> f64 {
    let (sum, count) = tensors
        .iter()
        .flat_map(|t| t.values.iter())
        .fold((0.0_f64, 0_usize), |(s, n), &v| (s + v as f64, n + 1));

    if count == 0 {
        tracing::warn!("No inference outputs collected; mean is NaN");
        return f64::NAN;
    }
    sum / count as f64
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::InferError;
    use crate::domain::tensor::Batch;
    use crate::domain::traits::LoadedModel;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    // In-memory reader over fixed batches
    struct VecReader {
        batches: Vec<Batch>,
    }

    impl BatchReader for VecReader {
        fn batches(&self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
            Box::new(self.batches.iter().cloned().map(Ok))
        }

        fn file_list(&self) -> &[PathBuf] {
            &[]
        }
    }

    fn scalar_batch(v: f32) -> Batch {
        let mut b = Batch::new();
        b.insert("x", HostTensor::scalar(v));
        b
    }

    // Fetches x and 10·x, and counts batches in _generated_var_0.
    // Records the accumulator value seen at the start of each run.
    #[derive(Default)]
    struct FakeEngine {
        seen_counter: RefCell<Vec<f32>>,
        fail_load: bool,
    }

    impl InferenceEngine for FakeEngine {
        type Program = ();

        fn load_inference_model(&self, _dir: &Path, scope: &mut Scope) -> Result<LoadedModel<()>> {
            if self.fail_load {
                return Err(InferError::Load("no program".into()).into());
            }
            scope.declare("_generated_var_0", &[1]);
            Ok(LoadedModel {
                program: (),
                feed_names: vec!["x".into()],
                fetch_names: vec!["x".into(), "x10".into()],
            })
        }

        fn run(&self, _m: &LoadedModel<()>, feed: &Batch, scope: &mut Scope) -> Result<Vec<HostTensor>> {
            let x = feed
                .get("x")
                .ok_or_else(|| InferError::Execution("missing x".into()))?
                .clone();
            let seen = scope.read("_generated_var_0").unwrap().values[0];
            self.seen_counter.borrow_mut().push(seen);
            scope.set("_generated_var_0", HostTensor::scalar(seen + 1.0));

            let x10 = HostTensor {
                shape: x.shape.clone(),
                values: x.values.iter().map(|v| v * 10.0).collect(),
            };
            Ok(vec![x, x10])
        }
    }

    fn accumulators() -> Vec<String> {
        vec!["_generated_var_0".to_string(), "_generated_var_1".to_string()]
    }

    #[test]
    fn test_mean_spans_all_batches_and_fetch_targets() {
        let engine = FakeEngine::default();
        let reader = VecReader { batches: vec![scalar_batch(1.0), scalar_batch(3.0)] };
        let vars = accumulators();
        let inferencer = Inferencer::new(&engine, &reader, 1, &vars);

        let mut scope = Scope::new();
        let mean = inferencer.run_infer(&CheckpointRef::new("m/0001"), &mut scope).unwrap();

        // [1, 10, 3, 30] → 11
        assert!((mean - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_accumulators_reset_once_per_checkpoint() {
        let engine = FakeEngine::default();
        let reader = VecReader { batches: vec![scalar_batch(1.0), scalar_batch(2.0)] };
        let vars = accumulators();
        let inferencer = Inferencer::new(&engine, &reader, 10, &vars);

        let mut scope = Scope::new();
        inferencer.run_infer(&CheckpointRef::new("m/0001"), &mut scope).unwrap();
        inferencer.run_infer(&CheckpointRef::new("m/0002"), &mut scope).unwrap();

        // Each checkpoint starts from zero and counts up within itself
        assert_eq!(*engine.seen_counter.borrow(), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_reset_accumulators_skips_missing_and_keeps_shape() {
        let mut scope = Scope::new();
        scope.set("_generated_var_0", HostTensor::new(vec![2, 2], vec![5.0; 4]).unwrap());
        scope.set("other", HostTensor::scalar(9.0));

        reset_accumulators(&mut scope, &accumulators());

        let v = scope.read("_generated_var_0").unwrap();
        assert_eq!(v, HostTensor::zeros(&[2, 2]));
        assert!(scope.var("_generated_var_1").is_none());
        assert_eq!(scope.read("other"), Some(HostTensor::scalar(9.0)));
    }

    #[test]
    fn test_load_failure_propagates() {
        let engine = FakeEngine { fail_load: true, ..Default::default() };
        let reader = VecReader { batches: vec![scalar_batch(1.0)] };
        let vars = accumulators();
        let inferencer = Inferencer::new(&engine, &reader, 1, &vars);

        let err = inferencer
            .run_infer(&CheckpointRef::new("m/empty"), &mut Scope::new())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<InferError>(), Some(InferError::Load(_))));
        assert!(engine.seen_counter.borrow().is_empty());
    }

    #[test]
    fn test_batch_error_aborts_checkpoint() {
        let engine = FakeEngine::default();
        let mut bad = Batch::new();
        bad.insert("y", HostTensor::scalar(1.0));
        let reader = VecReader { batches: vec![scalar_batch(1.0), bad, scalar_batch(2.0)] };
        let vars = accumulators();
        let inferencer = Inferencer::new(&engine, &reader, 1, &vars);

        let err = inferencer
            .run_infer(&CheckpointRef::new("m/0001"), &mut Scope::new())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<InferError>(), Some(InferError::Execution(_))));
        // The third batch never ran
        assert_eq!(engine.seen_counter.borrow().len(), 1);
    }

    #[test]
    fn test_progress_line_every_print_interval() {
        let results = vec![HostTensor::scalar(1.0), HostTensor::scalar(10.0)];
        let fired: Vec<usize> = (1..=5)
            .filter(|&id| progress_line(id, 2, &results).is_some())
            .collect();
        assert_eq!(fired, vec![2, 4]);

        assert_eq!(
            progress_line(2, 2, &results).as_deref(),
            Some("Infer res: [1], Infer res: [10], ")
        );
    }

    #[test]
    fn test_mean_of_flattens_tensors() {
        let tensors = vec![
            HostTensor::new(vec![2], vec![1.0, 2.0]).unwrap(),
            HostTensor::scalar(6.0),
        ];
        assert!((mean_of(&tensors) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_of_empty_is_nan() {
        assert!(mean_of(&[]).is_nan());
    }
}
