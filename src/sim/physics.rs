//! Physics capability
//!
//! The rigid-body engine is consumed, not built. The session talks to it
//! through `PhysicsBodies`; `HeadlessBodies` is an in-memory body store used by
//! the demo driver and tests.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::block::BlockId;

/// Per-body state read from the engine each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub pos: Vec2,
    pub rotation: f32,
    pub vel: Vec2,
    /// The engine judged this body motionless
    pub sleeping: bool,
    /// Immovable (kinematically frozen)
    pub is_static: bool,
}

/// What the core needs from a rigid-body engine
pub trait PhysicsBodies {
    /// Create a rectangular body for a block
    fn spawn(&mut self, id: BlockId, pos: Vec2, size: Vec2, is_static: bool);
    /// Remove a block's body
    fn despawn(&mut self, id: BlockId);
    /// Current state of a block's body
    fn body(&self, id: BlockId) -> Option<BodyState>;
    /// Toggle a body between static and dynamic
    fn set_static(&mut self, id: BlockId, is_static: bool);
}

/// Velocity damping per second (air friction)
const DAMPING_PER_SEC: f32 = 0.3;
/// Speed under which a body starts counting toward sleep
const SLEEP_SPEED: f32 = 0.02;
/// Seconds of quiet before a body falls asleep (Matter's 60 ticks)
const SLEEP_AFTER_SECS: f32 = 1.0;

#[derive(Debug, Clone)]
struct HeadlessBody {
    state: BodyState,
    size: Vec2,
    quiet_secs: f32,
}

/// In-memory bodies: positions integrate velocity, velocity decays and slow
/// bodies fall asleep. No gravity or contacts; callers place bodies directly.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBodies {
    bodies: BTreeMap<BlockId, HeadlessBody>,
}

impl HeadlessBodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn size(&self, id: BlockId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.size)
    }

    /// Set a body's velocity (wakes it)
    pub fn set_velocity(&mut self, id: BlockId, vel: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            if body.state.is_static {
                return;
            }
            body.state.vel = vel;
            body.state.sleeping = false;
            body.quiet_secs = 0.0;
        }
    }

    /// Teleport a body (wakes it)
    pub fn place(&mut self, id: BlockId, pos: Vec2, vel: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.pos = pos;
            body.state.sleeping = false;
            body.quiet_secs = 0.0;
            if !body.state.is_static {
                body.state.vel = vel;
            }
        }
    }

    /// Force the sleep flag
    pub fn set_sleeping(&mut self, id: BlockId, sleeping: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.sleeping = sleeping;
            if sleeping {
                body.state.vel = Vec2::ZERO;
            }
            body.quiet_secs = 0.0;
        }
    }

    /// Advance every dynamic, awake body by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let damping = (1.0 - DAMPING_PER_SEC * dt).clamp(0.0, 1.0);
        for body in self.bodies.values_mut() {
            let state = &mut body.state;
            if state.is_static || state.sleeping {
                continue;
            }
            state.pos += state.vel * dt;
            state.vel *= damping;

            if state.vel.length() < SLEEP_SPEED {
                body.quiet_secs += dt;
                if body.quiet_secs >= SLEEP_AFTER_SECS {
                    state.sleeping = true;
                    state.vel = Vec2::ZERO;
                }
            } else {
                body.quiet_secs = 0.0;
            }
        }
    }
}

impl PhysicsBodies for HeadlessBodies {
    fn spawn(&mut self, id: BlockId, pos: Vec2, size: Vec2, is_static: bool) {
        self.bodies.insert(
            id,
            HeadlessBody {
                state: BodyState {
                    pos,
                    rotation: 0.0,
                    vel: Vec2::ZERO,
                    sleeping: false,
                    is_static,
                },
                size,
                quiet_secs: 0.0,
            },
        );
    }

    fn despawn(&mut self, id: BlockId) {
        self.bodies.remove(&id);
    }

    fn body(&self, id: BlockId) -> Option<BodyState> {
        self.bodies.get(&id).map(|b| b.state)
    }

    fn set_static(&mut self, id: BlockId, is_static: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.state.is_static = is_static;
            if is_static {
                body.state.vel = Vec2::ZERO;
            }
            body.quiet_secs = 0.0;
        }
    }
}
