//! Crate Stacker - stability and scoring core for a block-stacking puzzle
//!
//! Core modules:
//! - `sim`: Per-tick pipeline (stability, tower height, game over, session)
//! - `settings`: Tunable constants with JSON loading
//! - `labels`: Container labels stamped on each block

pub mod labels;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// World dimensions (screen space, y grows downward)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Ground slab thickness; its top edge is the baseline
    pub const GROUND_HEIGHT: f32 = 40.0;
    pub const BASELINE_Y: f32 = WORLD_HEIGHT - GROUND_HEIGHT;

    /// Blocks whose center falls below this line no longer count
    pub const OFFSCREEN_CUTOFF_Y: f32 = WORLD_HEIGHT + 50.0;

    /// A sleeping block centered above this line ends the run
    pub const TOP_BOUNDARY_Y: f32 = 50.0;

    /// Speed under which physics jitter counts as motionless
    pub const SPEED_DEADBAND: f32 = 0.05;

    /// How long the tower must stay settled before it counts (ms)
    pub const STABILITY_HOLD_MS: f64 = 3000.0;
    /// Game-over poll cadence (ms)
    pub const GAME_OVER_POLL_MS: f64 = 1000.0;

    /// Seed layout
    pub const INITIAL_BLOCKS: usize = 5;
    pub const SEED_BLOCK_WIDTH: f32 = 80.0;
    pub const SEED_BLOCK_HEIGHT: f32 = 40.0;

    /// New blocks drop in from here
    pub const SPAWN_Y: f32 = 100.0;

    /// Fixed frame step used by the headless driver (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
}

/// Round to two decimal places (score display precision)
#[inline]
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
