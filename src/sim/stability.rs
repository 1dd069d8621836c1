//! Tower stability
//!
//! Two stages: the evaluator classifies every visible block each tick and ANDs
//! the result into a tower-wide verdict; the timer debounces that verdict into
//! a single "tower settled" confirmation after the hold duration.

use serde::{Deserialize, Serialize};

use super::block::{Block, BlockRegistry};

/// Tower-wide result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StabilityVerdict {
    /// Every visible block is stable and there is at least one
    pub settled: bool,
    pub stable_blocks: usize,
    pub visible_blocks: usize,
}

/// A block counts as stable when the engine has put it to sleep, or when its
/// speed sits inside the deadband and the pointer is not holding it. The
/// pointer spring injects velocity of its own, so a slow dragged block does
/// not count.
#[inline]
pub fn block_is_stable(block: &Block, deadband: f32) -> bool {
    block.sleeping || (block.speed < deadband && !block.dragged)
}

/// Classify the visible blocks and aggregate
pub fn evaluate(registry: &BlockRegistry, cutoff_y: f32, deadband: f32) -> StabilityVerdict {
    let mut verdict = StabilityVerdict::default();
    for block in registry.visible(cutoff_y) {
        verdict.visible_blocks += 1;
        if block_is_stable(block, deadband) {
            verdict.stable_blocks += 1;
        }
    }
    verdict.settled = verdict.visible_blocks > 0 && verdict.stable_blocks == verdict.visible_blocks;
    verdict
}

/// Confirmation window state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StabilityState {
    /// No window in flight
    Unsettled,
    /// Verdict has held since `start_ms`
    Settling { start_ms: f64, progress_pct: f32 },
    /// Hold completed on this tick (never stored; the timer re-arms at once)
    Confirmed,
}

/// Debounces the per-tick verdict into a confirmation
#[derive(Debug, Clone)]
pub struct StabilityTimer {
    state: StabilityState,
    hold_ms: f64,
}

impl StabilityTimer {
    pub fn new(hold_ms: f64) -> Self {
        Self {
            state: StabilityState::Unsettled,
            hold_ms,
        }
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn hold_ms(&self) -> f64 {
        self.hold_ms
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.state, StabilityState::Settling { .. })
    }

    /// Display progress of the current window, 0 when none
    pub fn progress_pct(&self) -> f32 {
        match self.state {
            StabilityState::Settling { progress_pct, .. } => progress_pct,
            _ => 0.0,
        }
    }

    /// Open a window at `now_ms`. No-op while one is already running.
    pub fn begin(&mut self, now_ms: f64) {
        if self.is_settling() {
            return;
        }
        log::debug!("Stability window opened at {:.0} ms", now_ms);
        self.state = StabilityState::Settling {
            start_ms: now_ms,
            progress_pct: 0.0,
        };
    }

    /// Discard the in-flight window entirely
    pub fn reset(&mut self) {
        if self.is_settling() {
            log::debug!("Stability window discarded");
        }
        self.state = StabilityState::Unsettled;
    }

    /// Feed one tick's verdict. Returns `Confirmed` on the tick the hold
    /// completes; the stored state is then already back to `Unsettled`.
    pub fn advance(&mut self, settled: bool, now_ms: f64) -> StabilityState {
        if !settled {
            self.reset();
            return self.state;
        }

        match self.state {
            StabilityState::Settling { start_ms, .. } => {
                let elapsed = now_ms - start_ms;
                if elapsed >= self.hold_ms {
                    self.state = StabilityState::Unsettled;
                    return StabilityState::Confirmed;
                }
                let progress_pct = (elapsed / self.hold_ms).clamp(0.0, 1.0) as f32 * 100.0;
                self.state = StabilityState::Settling {
                    start_ms,
                    progress_pct,
                };
            }
            StabilityState::Unsettled | StabilityState::Confirmed => self.begin(now_ms),
        }
        self.state
    }
}
