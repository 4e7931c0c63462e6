// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses the command line
// with `clap` and hands the loaded configuration to Layer 2.
//
//   epoch-infer -m config.yaml
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::application::infer_use_case::InferUseCase;
use crate::infra::{config::YamlConfig, metrics::ResultRecorder};

/// Evaluate every epoch checkpoint under `runner.model_save_path`
/// and write one averaged metric per checkpoint.
#[derive(Parser, Debug)]
#[command(
    name = "epoch-infer",
    version = "0.1.0",
    about = "Run batch inference over every saved epoch of a model."
)]
pub struct Cli {
    /// YAML run configuration
    #[arg(short = 'm', long = "config_yaml")]
    pub config_yaml: PathBuf,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = YamlConfig::load(&self.config_yaml)?;
        config.print();

        if !InferUseCase::should_run(&config) {
            tracing::warn!(
                "runner.model_save_path is unset or does not exist, nothing to infer"
            );
            return Ok(());
        }

        let results = InferUseCase::new(config, ResultRecorder::default())?.execute()?;
        println!("Evaluated {} checkpoint(s).", results.len());
        Ok(())
    }
}
