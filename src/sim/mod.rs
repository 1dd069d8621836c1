//! Stability and scoring simulation
//!
//! All judging logic lives here. This module must stay deterministic and free
//! of rendering:
//! - Time is passed in explicitly, never read from a clock
//! - Seeded RNG only
//! - Stable iteration order (by block ID)
//! - Physics is consumed through `PhysicsBodies`, never owned

pub mod block;
pub mod game_over;
pub mod metrics;
pub mod physics;
pub mod session;
pub mod stability;
pub mod tick;

pub use block::{Block, BlockId, BlockMeta, BlockRegistry};
pub use game_over::{Cadence, breaching_block};
pub use metrics::{BestRecord, TowerMetrics, efficiency};
pub use physics::{BodyState, HeadlessBodies, PhysicsBodies};
pub use session::{
    BlockView, GameEvent, MAX_QUEUED_EVENTS, Session, SessionPhase, TowerSnapshot, seed_layout,
};
pub use stability::{StabilityState, StabilityTimer, StabilityVerdict, block_is_stable, evaluate};
pub use tick::{TickInput, tick};
