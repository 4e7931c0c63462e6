// ============================================================
// Layer 4 — Slot Batcher
// ============================================================
// Turns text lines into named tensor batches.
//
// Line format (one example per line, one group per feed slot,
// in feed order, groups separated by ';'):
//
//   0.12 0.55 0.91;1
//   └──── dense ───┘ └ label
//
// Each group must hold exactly `dim` values for its slot.
//
// How batching works here:
//   Input:  N parsed examples, each with one Vec<f32> per slot
//   Output: Batch with one tensor per slot of shape [N, dim]
//
//   For every slot we flatten the N rows into one Vec and pair
//   it with the shape:
//   [r1_v1, ..., r1_vD, r2_v1, ..., rN_vD] → [N, D]

use anyhow::Result;

use crate::domain::error::InferError;
use crate::domain::tensor::{Batch, FeedSlot, HostTensor};

/// Values of one example, one Vec per feed slot.
pub type Example = Vec<Vec<f32>>;

#[derive(Debug, Clone)]
pub struct SlotBatcher {
    slots: Vec<FeedSlot>,
}

impl SlotBatcher {
    pub fn new(slots: Vec<FeedSlot>) -> Self {
        Self { slots }
    }

    /// Parse one data line. `origin` is only used in error messages.
    pub fn parse_line(&self, line: &str, origin: &str) -> Result<Example> {
        let groups: Vec<&str> = line.split(';').collect();
        if groups.len() != self.slots.len() {
            return Err(InferError::Data(format!(
                "{origin}: expected {} slot group(s), found {}",
                self.slots.len(),
                groups.len()
            ))
            .into());
        }

        let mut example = Vec::with_capacity(self.slots.len());
        for (slot, group) in self.slots.iter().zip(groups) {
            let values = group
                .split_whitespace()
                .map(|tok| tok.parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    InferError::Data(format!("{origin}: slot '{}': {e}", slot.name))
                })?;
            if values.len() != slot.dim {
                return Err(InferError::Data(format!(
                    "{origin}: slot '{}' expects {} value(s), found {}",
                    slot.name,
                    slot.dim,
                    values.len()
                ))
                .into());
            }
            example.push(values);
        }
        Ok(example)
    }

    /// Stack parsed examples into a batch. `items` must not be empty.
    pub fn batch(&self, items: &[Example]) -> Batch {
        let rows = items.len();
        let mut batch = Batch::new();

        for (idx, slot) in self.slots.iter().enumerate() {
            let flat: Vec<f32> = items
                .iter()
                .flat_map(|ex| ex[idx].iter().copied())
                .collect();
            batch.insert(
                slot.name.clone(),
                HostTensor { shape: vec![rows, slot.dim], values: flat },
            );
        }
        batch
    }
}
