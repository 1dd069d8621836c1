//! Game-over detection
//!
//! Polled on its own wall-clock cadence rather than every tick, so a block
//! briefly tossed above the line mid-collision does not end the run.

use super::block::{BlockId, BlockRegistry};

/// Fixed-interval poll schedule
#[derive(Debug, Clone)]
pub struct Cadence {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl Cadence {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// True once per elapsed interval. The first call only anchors the clock.
    pub fn ready(&mut self, now_ms: f64) -> bool {
        match self.last_ms {
            None => {
                self.last_ms = Some(now_ms);
                false
            }
            Some(last) if now_ms - last >= self.interval_ms => {
                self.last_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// First block that is both above the top boundary and asleep.
///
/// A block still moving above the line does not count; the physics engine
/// has to have judged it motionless.
pub fn breaching_block(registry: &BlockRegistry, top_boundary_y: f32) -> Option<BlockId> {
    registry
        .iter()
        .find(|b| b.pos.y < top_boundary_y && b.sleeping)
        .map(|b| b.id)
}
