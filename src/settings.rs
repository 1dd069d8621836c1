//! Tunable game settings
//!
//! Every reference constant from `consts` can be overridden from a JSON file.
//! Missing fields fall back to their defaults.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Why a settings document was rejected
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "failed to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "malformed settings: {}", e),
            SettingsError::Invalid(why) => write!(f, "invalid settings: {}", why),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Stability ===
    /// Per-block speed deadband
    pub speed_deadband: f32,
    /// Hold duration before a settled tower is confirmed (ms)
    pub stability_hold_ms: f64,

    // === Game over ===
    /// Poll cadence for the game-over check (ms)
    pub game_over_poll_ms: f64,
    /// Screen-space y above which a sleeping block ends the run
    pub top_boundary_y: f32,

    // === Tower geometry ===
    /// Ground line height is measured from
    pub baseline_y: f32,
    /// Blocks below this line are ignored for height and score
    pub offscreen_cutoff_y: f32,

    // === Blocks ===
    /// Number of blocks in the seed layout (at most `INITIAL_BLOCKS`)
    pub initial_blocks: usize,
    pub new_block_width: RangeInclusive<u32>,
    pub new_block_height: RangeInclusive<u32>,
    pub new_block_x: RangeInclusive<u32>,
    pub spawn_y: f32,

    /// RNG seed for block sizes and labels
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed_deadband: SPEED_DEADBAND,
            stability_hold_ms: STABILITY_HOLD_MS,

            game_over_poll_ms: GAME_OVER_POLL_MS,
            top_boundary_y: TOP_BOUNDARY_Y,

            baseline_y: BASELINE_Y,
            offscreen_cutoff_y: OFFSCREEN_CUTOFF_Y,

            initial_blocks: INITIAL_BLOCKS,
            new_block_width: 60..=100,
            new_block_height: 30..=50,
            new_block_x: 100..=(WORLD_WIDTH as u32 - 100),
            spawn_y: SPAWN_Y,

            seed: 0x5eed_b10c,
        }
    }
}

impl Settings {
    /// Parse and validate a JSON settings document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{} ({}), using defaults", e, path.display());
                Self::default()
            }
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.speed_deadband >= 0.0) {
            return Err(SettingsError::Invalid("speed_deadband must be >= 0"));
        }
        if !(self.stability_hold_ms > 0.0) {
            return Err(SettingsError::Invalid("stability_hold_ms must be > 0"));
        }
        if !(self.game_over_poll_ms > 0.0) {
            return Err(SettingsError::Invalid("game_over_poll_ms must be > 0"));
        }
        if self.offscreen_cutoff_y <= self.baseline_y {
            return Err(SettingsError::Invalid(
                "offscreen_cutoff_y must lie below baseline_y",
            ));
        }
        if self.top_boundary_y >= self.baseline_y {
            return Err(SettingsError::Invalid(
                "top_boundary_y must lie above baseline_y",
            ));
        }
        if self.initial_blocks > INITIAL_BLOCKS {
            return Err(SettingsError::Invalid(
                "initial_blocks exceeds the seed layout",
            ));
        }
        if self.new_block_width.is_empty()
            || self.new_block_height.is_empty()
            || self.new_block_x.is_empty()
        {
            return Err(SettingsError::Invalid("new block ranges must be non-empty"));
        }
        if *self.new_block_width.start() == 0 || *self.new_block_height.start() == 0 {
            return Err(SettingsError::Invalid("new block sizes must be positive"));
        }
        Ok(())
    }
}
