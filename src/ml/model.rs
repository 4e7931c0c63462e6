// ============================================================
// Layer 5 — Inference Model Definition
// ============================================================
// The network half of the run config: which input variables the
// model expects and how wide each one is. The reader needs this
// to split data lines into slots; the saved program itself only
// knows variable names.
//
//   hyper_parameters:
//     feeds:
//       - { name: dense, dim: 13 }
//       - { name: label, dim: 1 }

use anyhow::Result;
use std::collections::HashSet;

use crate::domain::error::InferError;
use crate::domain::tensor::FeedSlot;
use crate::infra::config::YamlConfig;

pub const FEEDS_KEY: &str = "hyper_parameters.feeds";

#[derive(Debug, Clone)]
pub struct InferModel {
    feeds: Vec<FeedSlot>,
}

impl InferModel {
    pub fn from_config(cfg: &YamlConfig) -> Result<Self> {
        let feeds: Vec<FeedSlot> = cfg.section(FEEDS_KEY)?;
        if feeds.is_empty() {
            return Err(InferError::Config(format!("{FEEDS_KEY} must not be empty")).into());
        }

        let mut seen = HashSet::new();
        for slot in &feeds {
            if slot.dim == 0 {
                return Err(InferError::Config(format!(
                    "{FEEDS_KEY}: feed '{}' has dim 0",
                    slot.name
                ))
                .into());
            }
            if !seen.insert(slot.name.as_str()) {
                return Err(InferError::Config(format!(
                    "{FEEDS_KEY}: duplicate feed '{}'",
                    slot.name
                ))
                .into());
            }
        }
        Ok(Self { feeds })
    }

    /// Input slots in the order data lines list them
    pub fn create_feeds(&self) -> Vec<FeedSlot> {
        self.feeds.clone()
    }
}
