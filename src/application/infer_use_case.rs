// ============================================================
// Layer 2 — InferUseCase
// ============================================================
// Orchestrates a full batch-inference run in order:
//
//   Step 1: Build the network feed list   (Layer 5 - ml)
//   Step 2: Build the reader once         (Layer 4 - data)
//   Step 3: Count the evaluation set      (Layer 4 - data)
//   Step 4: Pick the execution device     (Layer 5 - ml)
//   Step 5: Discover epoch checkpoints    (Layer 6 - infra)
//   Step 6: Evaluate each checkpoint      (Layer 5 - ml)
//   Step 7: Record all results            (Layer 6 - infra)
//
// Checkpoints are evaluated strictly one after another in sorted
// order, all sharing one reader and one variable scope. Any
// failure aborts the run; results are only written after the
// last checkpoint.

use anyhow::Result;

use crate::data::{counter::CountMethod, reader::SlotFileReader};
use crate::domain::scope::Scope;
use crate::domain::traits::{BatchReader, InferenceEngine};
use crate::infra::{
    checkpoint::discover_checkpoints,
    config::{RunnerConfig, YamlConfig},
    metrics::{InferResultDict, ResultRecorder},
};
use crate::ml::{
    executor::{DeviceExecutor, Place},
    inferencer::Inferencer,
    model::InferModel,
};

pub struct InferUseCase {
    config: YamlConfig,
    runner: RunnerConfig,
    recorder: ResultRecorder,
}

impl InferUseCase {
    pub fn new(config: YamlConfig, recorder: ResultRecorder) -> Result<Self> {
        let runner = RunnerConfig::from_yaml(&config)?;
        Ok(Self { config, runner, recorder })
    }

    /// A run only happens when `runner.model_save_path` is set and the
    /// directory it names exists.
    pub fn should_run(config: &YamlConfig) -> bool {
        match config.get("runner.model_save_path").and_then(|v| v.as_str()) {
            Some(path) if !path.is_empty() => config.resolve(path).exists(),
            _ => false,
        }
    }

    /// Execute the whole pipeline with the engine chosen by `runner.use_gpu`.
    pub fn execute(&self) -> Result<InferResultDict> {
        let cfg = &self.runner;

        // ── Step 1: Network ───────────────────────────────────────────────────
        let model = InferModel::from_config(&self.config)?;
        let feeds = model.create_feeds();
        tracing::info!(
            "Feeds: {:?}",
            feeds.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
        );

        // ── Step 2: Reader ────────────────────────────────────────────────────
        let reader = SlotFileReader::new(&cfg.test_data_dir, feeds, cfg.infer_batch_size)?;

        // ── Step 3: Example count ─────────────────────────────────────────────
        // An unsupported method fails here, before any checkpoint is loaded
        let count_method = CountMethod::parse(&cfg.example_count_method)?;
        let example_nums = count_method.count(reader.file_list())?;
        tracing::info!("Infer {} count: {}", cfg.example_count_method, example_nums);

        // ── Step 4: Device ────────────────────────────────────────────────────
        let place = Place::from_use_gpu(cfg.use_gpu);
        tracing::info!("Execution place: {:?}", place);
        let engine = DeviceExecutor::for_place(place);

        // ── Steps 5-7 ─────────────────────────────────────────────────────────
        self.run_with(&engine, &reader)
    }

    /// Evaluate every checkpoint with the given engine and reader, then
    /// record the results.
    pub fn run_with<E, R>(&self, engine: &E, reader: &R) -> Result<InferResultDict>
    where
        E: InferenceEngine,
        R: BatchReader + ?Sized,
    {
        let cfg = &self.runner;
        tracing::info!("init_model_path: {}", cfg.model_save_path.display());
        let checkpoints = discover_checkpoints(&cfg.model_save_path)?;

        let mut scope = Scope::new();
        let inferencer = Inferencer::new(engine, reader, cfg.print_interval, &cfg.accumulator_vars);

        let mut results = InferResultDict::new();
        for ckpt in &checkpoints {
            tracing::info!("Begin Infer Model {}", ckpt.path.display());
            let infer_res = inferencer.run_infer(ckpt, &mut scope)?;
            results.insert(ckpt.name.clone(), infer_res);
        }

        self.recorder.record(&results)?;
        tracing::info!("Run Success, Exit.");
        Ok(results)
    }
}
