//! Tower height and efficiency score
//!
//! Height is measured from the baseline to the highest top edge among visible
//! blocks. The efficiency score rewards tall towers built from few blocks.

use serde::{Deserialize, Serialize};

use super::block::BlockRegistry;
use crate::round2;

/// Per-tick tower measurements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TowerMetrics {
    /// Pixels from baseline to the topmost visible edge (never negative)
    pub current_height: u32,
    pub visible_blocks: usize,
    /// `current_height / visible_blocks`, two decimals, 0 with no blocks
    pub efficiency_score: f32,
}

impl TowerMetrics {
    /// Measure the visible tower
    pub fn measure(registry: &BlockRegistry, baseline_y: f32, cutoff_y: f32) -> Self {
        let mut highest = baseline_y;
        let mut visible_blocks = 0;
        for block in registry.visible(cutoff_y) {
            visible_blocks += 1;
            highest = highest.min(block.top_edge());
        }

        let current_height = (baseline_y - highest).round().max(0.0) as u32;
        Self {
            current_height,
            visible_blocks,
            efficiency_score: efficiency(current_height, visible_blocks),
        }
    }
}

/// Height per block, rounded to two decimals
pub fn efficiency(height: u32, blocks: usize) -> f32 {
    if blocks == 0 {
        return 0.0;
    }
    round2(height as f32 / blocks as f32)
}

/// Best tower ever confirmed this session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BestRecord {
    pub best_height: u32,
    pub best_score: f32,
}

impl BestRecord {
    /// Fold a confirmed tower into the record. Only a strictly taller tower
    /// counts; its score replaces the best score only when it is higher.
    /// Returns true when the height record moved.
    pub fn record_confirmed(&mut self, metrics: &TowerMetrics) -> bool {
        if metrics.current_height <= self.best_height {
            return false;
        }
        self.best_height = metrics.current_height;

        if metrics.visible_blocks > 0 && metrics.efficiency_score > self.best_score {
            self.best_score = metrics.efficiency_score;
        }
        true
    }

    /// Score of the best height spread over `blocks`
    pub fn final_score(&self, blocks: usize) -> f32 {
        efficiency(self.best_height, blocks)
    }

    /// Screen y of the best-height marker line
    pub fn marker_y(&self, baseline_y: f32) -> f32 {
        baseline_y - self.best_height as f32
    }
}
