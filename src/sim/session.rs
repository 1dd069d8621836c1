//! Game session state
//!
//! Everything that changes during a run lives in `Session` and is threaded
//! explicitly through `tick`. Presentation never reads it directly: it reads
//! the `TowerSnapshot` published at the end of each tick and drains events.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::{Block, BlockId, BlockMeta, BlockRegistry};
use super::game_over::{Cadence, breaching_block};
use super::metrics::{BestRecord, TowerMetrics};
use super::physics::PhysicsBodies;
use super::stability::{StabilityState, StabilityTimer, StabilityVerdict, evaluate};
use crate::consts::*;
use crate::labels;
use crate::settings::Settings;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Seed tower frozen, waiting for the first interaction
    #[default]
    NotStarted,
    /// Physics live, pipeline running, blocks may be added
    Running,
    /// Run ended; bodies stay live for display, only restart is accepted
    Over,
}

/// Lifecycle events for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    BlockAdded {
        id: BlockId,
    },
    TowerConfirmedStable {
        height: u32,
        score: f32,
        new_best: bool,
    },
    GameOver {
        best_height: u32,
        final_score: f32,
        blocks_used: usize,
    },
    Restarted,
}

/// Read-only view of one block for label/sprite followers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub id: BlockId,
    pub pos: Vec2,
    pub rotation: f32,
    pub size: Vec2,
    pub label: String,
    pub variant: String,
    pub color: u32,
    pub dragged: bool,
}

/// Everything presentation needs, published once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TowerSnapshot {
    pub phase: SessionPhase,
    pub time_ms: f64,
    pub current_height: u32,
    pub visible_blocks: usize,
    pub efficiency_score: f32,
    pub best_height: u32,
    pub best_score: f32,
    /// Progress of the confirmation window, 0-100
    pub stability_progress_pct: f32,
    /// This tick's tower-wide verdict
    pub is_stable: bool,
    /// Screen y of the best-height marker
    pub best_marker_y: f32,
    pub can_add_block: bool,
    pub blocks: Vec<BlockView>,
}

/// Events kept when the host stops draining; older ones are dropped first
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Seed layout: (center, size) for each of the initial blocks
pub fn seed_layout() -> [(Vec2, Vec2); INITIAL_BLOCKS] {
    let w = SEED_BLOCK_WIDTH;
    let h = SEED_BLOCK_HEIGHT;
    let cx = WORLD_WIDTH / 2.0;
    let start_y = WORLD_HEIGHT - 70.0;
    [
        // Wide base
        (Vec2::new(cx, start_y), Vec2::new(w * 3.0, h)),
        // Two blocks with a gap
        (Vec2::new(cx - w, start_y - h), Vec2::new(w * 1.2, h)),
        (Vec2::new(cx + w, start_y - h), Vec2::new(w * 1.2, h)),
        // Bridge
        (Vec2::new(cx, start_y - h * 2.0), Vec2::new(w * 1.8, h)),
        // Off-center cap
        (Vec2::new(cx - 30.0, start_y - h * 3.0), Vec2::new(w, h)),
    ]
}

/// A single run of the game
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub phase: SessionPhase,
    pub registry: BlockRegistry,
    pub timer: StabilityTimer,
    pub verdict: StabilityVerdict,
    pub metrics: TowerMetrics,
    pub best: BestRecord,
    /// Time of the last tick (ms)
    pub time_ms: f64,
    pub(crate) game_over_poll: Cadence,
    rng: Pcg32,
    /// Drained by the host once per tick, capped at `MAX_QUEUED_EVENTS`
    events: Vec<GameEvent>,
    snapshot: TowerSnapshot,
}

impl Session {
    /// Create a session with the seed tower in place and frozen. Settings
    /// that fail validation are replaced by the defaults.
    pub fn new<P: PhysicsBodies>(settings: Settings, bodies: &mut P) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("{}, using default settings", e);
                Settings::default()
            }
        };
        let mut session = Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            phase: SessionPhase::NotStarted,
            registry: BlockRegistry::new(),
            timer: StabilityTimer::new(settings.stability_hold_ms),
            verdict: StabilityVerdict::default(),
            metrics: TowerMetrics::default(),
            best: BestRecord::default(),
            time_ms: 0.0,
            game_over_poll: Cadence::new(settings.game_over_poll_ms),
            events: Vec::new(),
            snapshot: TowerSnapshot::default(),
            settings,
        };
        session.spawn_seed_blocks(bodies);
        session.publish_snapshot();
        session
    }

    fn spawn_seed_blocks<P: PhysicsBodies>(&mut self, bodies: &mut P) {
        for (pos, size) in seed_layout()
            .into_iter()
            .take(self.settings.initial_blocks)
        {
            self.spawn_block(bodies, pos, size, true);
        }
    }

    /// Create a block record and its body
    fn spawn_block<P: PhysicsBodies>(
        &mut self,
        bodies: &mut P,
        pos: Vec2,
        size: Vec2,
        is_static: bool,
    ) -> BlockId {
        let id = self.registry.next_block_id();
        let meta = BlockMeta {
            label: labels::crate_name(&mut self.rng).to_string(),
            variant: labels::version(&mut self.rng),
            color: labels::color(&mut self.rng),
        };
        let mut block = Block::new(id, pos, size, meta);
        block.is_static = is_static;
        bodies.spawn(id, pos, size, is_static);
        self.registry.insert(block);
        id
    }

    /// First interaction: unfreeze every block and start evaluating
    pub fn start<P: PhysicsBodies>(&mut self, bodies: &mut P) {
        if self.phase != SessionPhase::NotStarted {
            return;
        }
        for block in self.registry.iter_mut() {
            bodies.set_static(block.id, false);
            block.is_static = false;
        }
        self.phase = SessionPhase::Running;
        self.game_over_poll.reset();
        self.measure();
        self.emit(GameEvent::Started);
        log::info!("Session started with {} blocks", self.registry.len());
    }

    /// Drop a new random block in from the top. Only while running.
    pub fn add_block<P: PhysicsBodies>(&mut self, bodies: &mut P) -> Option<BlockId> {
        if self.phase != SessionPhase::Running {
            log::debug!("Add block ignored in {:?}", self.phase);
            return None;
        }
        let width = self.rng.random_range(self.settings.new_block_width.clone()) as f32;
        let height = self.rng.random_range(self.settings.new_block_height.clone()) as f32;
        let x = self.rng.random_range(self.settings.new_block_x.clone()) as f32;
        let pos = Vec2::new(x, self.settings.spawn_y);

        let id = self.spawn_block(bodies, pos, Vec2::new(width, height), false);
        self.measure();
        self.emit(GameEvent::BlockAdded { id });
        log::info!(
            "Block {} added ({}x{} at x={}), {} blocks",
            id.0,
            width,
            height,
            x,
            self.registry.len()
        );
        Some(id)
    }

    /// Pointer grabbed a block. Unknown ids are ignored.
    pub fn begin_drag(&mut self, id: BlockId) {
        if self.phase != SessionPhase::Running {
            return;
        }
        if self.registry.get(id).is_none() {
            log::debug!("Drag start for unknown block {}", id.0);
            return;
        }
        for block in self.registry.iter_mut() {
            block.dragged = block.id == id;
        }
        self.timer.reset();
    }

    /// Pointer released a block. Unknown or undragged ids are ignored.
    pub fn end_drag(&mut self, id: BlockId) {
        match self.registry.get_mut(id) {
            Some(block) => block.dragged = false,
            None => log::debug!("Drag end for unknown block {}", id.0),
        }
    }

    /// Tear down every block and reseed a fresh, unstarted session
    pub fn restart<P: PhysicsBodies>(&mut self, bodies: &mut P) {
        // Window and followers go first so nothing points at dead blocks
        self.timer.reset();
        self.snapshot.blocks.clear();

        for id in self.registry.ids() {
            bodies.despawn(id);
        }
        self.registry.clear();

        self.phase = SessionPhase::NotStarted;
        self.verdict = StabilityVerdict::default();
        self.metrics = TowerMetrics::default();
        self.best = BestRecord::default();
        self.game_over_poll.reset();

        self.spawn_seed_blocks(bodies);
        self.publish_snapshot();
        self.emit(GameEvent::Restarted);
        log::info!("Session restarted");
    }

    /// Copy poses from physics into the registry
    pub fn sync_bodies<P: PhysicsBodies>(&mut self, bodies: &P) {
        for block in self.registry.iter_mut() {
            match bodies.body(block.id) {
                Some(body) => block.sync(&body),
                None => log::debug!("No body for block {}", block.id.0),
            }
        }
    }

    /// Recompute height and score from the registry
    pub fn measure(&mut self) {
        self.metrics = TowerMetrics::measure(
            &self.registry,
            self.settings.baseline_y,
            self.settings.offscreen_cutoff_y,
        );
    }

    /// Evaluate the verdict, remeasure, and feed the timer. Returns true on
    /// the tick the tower is confirmed stable.
    pub fn run_pipeline(&mut self, now_ms: f64) -> bool {
        self.verdict = evaluate(
            &self.registry,
            self.settings.offscreen_cutoff_y,
            self.settings.speed_deadband,
        );
        self.measure();

        if self.timer.advance(self.verdict.settled, now_ms) != StabilityState::Confirmed {
            return false;
        }

        let new_best = self.best.record_confirmed(&self.metrics);
        self.emit(GameEvent::TowerConfirmedStable {
            height: self.metrics.current_height,
            score: self.metrics.efficiency_score,
            new_best,
        });
        log::info!(
            "Tower stable: height {} px, score {}{}",
            self.metrics.current_height,
            self.metrics.efficiency_score,
            if new_best { " (new best)" } else { "" }
        );
        true
    }

    /// Check the failure condition. Ends the run when a sleeping block sits
    /// above the top boundary.
    pub fn poll_game_over(&mut self) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        let Some(id) = breaching_block(&self.registry, self.settings.top_boundary_y) else {
            return false;
        };

        // One last chance to bank the tower before freezing
        self.measure();
        self.best.record_confirmed(&self.metrics);
        self.timer.reset();

        let blocks_used = self.metrics.visible_blocks;
        let final_score = self.best.final_score(blocks_used);
        self.phase = SessionPhase::Over;
        for block in self.registry.iter_mut() {
            block.dragged = false;
        }
        self.emit(GameEvent::GameOver {
            best_height: self.best.best_height,
            final_score,
            blocks_used,
        });
        log::info!(
            "Game over (block {} breached the top): height {} px, final score {}, {} blocks",
            id.0,
            self.best.best_height,
            final_score,
            blocks_used
        );
        true
    }

    /// Rebuild the presentation snapshot from current state
    pub fn publish_snapshot(&mut self) {
        let baseline_y = self.settings.baseline_y;
        self.snapshot = TowerSnapshot {
            phase: self.phase,
            time_ms: self.time_ms,
            current_height: self.metrics.current_height,
            visible_blocks: self.metrics.visible_blocks,
            efficiency_score: self.metrics.efficiency_score,
            best_height: self.best.best_height,
            best_score: self.best.best_score,
            stability_progress_pct: self.timer.progress_pct(),
            is_stable: self.phase == SessionPhase::Running && self.verdict.settled,
            best_marker_y: self.best.marker_y(baseline_y),
            can_add_block: self.phase == SessionPhase::Running,
            blocks: self
                .registry
                .iter()
                .map(|b| BlockView {
                    id: b.id,
                    pos: b.pos,
                    rotation: b.rotation,
                    size: b.size,
                    label: b.meta.label.clone(),
                    variant: b.meta.variant.clone(),
                    color: b.meta.color,
                    dragged: b.dragged,
                })
                .collect(),
        };
    }

    pub fn snapshot(&self) -> &TowerSnapshot {
        &self.snapshot
    }

    fn emit(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_QUEUED_EVENTS {
            log::warn!("Event queue full, dropping {:?}", self.events[0]);
            self.events.remove(0);
        }
        self.events.push(event);
    }

    /// Take all events queued since the last drain. Hosts call this every
    /// tick; undrained events past `MAX_QUEUED_EVENTS` are lost oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::HeadlessBodies;

    fn session() -> (Session, HeadlessBodies) {
        let mut bodies = HeadlessBodies::new();
        let session = Session::new(Settings::default(), &mut bodies);
        (session, bodies)
    }

    fn dragged(session: &Session) -> Vec<BlockId> {
        session
            .registry
            .iter()
            .filter(|b| b.dragged)
            .map(|b| b.id)
            .collect()
    }

    #[test]
    fn new_session_is_frozen_seed_tower() {
        let (session, bodies) = session();
        assert_eq!(session.phase, SessionPhase::NotStarted);
        assert_eq!(session.registry.len(), 5);
        assert_eq!(bodies.len(), 5);
        for block in session.registry.iter() {
            assert!(bodies.body(block.id).unwrap().is_static);
            assert!(!block.meta.label.is_empty());
        }
        assert_eq!(session.snapshot().blocks.len(), 5);
        assert!(!session.snapshot().can_add_block);
    }

    #[test]
    fn start_unfreezes_and_measures() {
        let (mut session, mut bodies) = session();
        session.start(&mut bodies);
        assert_eq!(session.phase, SessionPhase::Running);
        for block in session.registry.iter() {
            assert!(!bodies.body(block.id).unwrap().is_static);
        }
        assert_eq!(session.metrics.current_height, 170);
        assert_eq!(session.drain_events(), vec![GameEvent::Started]);

        // Starting twice is a no-op
        session.start(&mut bodies);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn add_block_requires_running() {
        let (mut session, mut bodies) = session();
        assert_eq!(session.add_block(&mut bodies), None);
        assert_eq!(session.registry.len(), 5);

        session.start(&mut bodies);
        let id = session.add_block(&mut bodies).expect("running session accepts blocks");
        let block = session.registry.get(id).unwrap();
        assert!((60.0..=100.0).contains(&block.size.x));
        assert!((30.0..=50.0).contains(&block.size.y));
        assert!((100.0..=700.0).contains(&block.pos.x));
        assert_eq!(block.pos.y, 100.0);
        assert!(!bodies.body(id).unwrap().is_static);
    }

    #[test]
    fn drag_end_for_missing_block_is_ignored() {
        let (mut session, mut bodies) = session();
        session.start(&mut bodies);
        session.end_drag(BlockId(404));
        session.begin_drag(BlockId(404));
        assert!(dragged(&session).is_empty());
    }

    #[test]
    fn only_one_block_is_dragged() {
        let (mut session, mut bodies) = session();
        session.start(&mut bodies);
        session.begin_drag(BlockId(1));
        session.begin_drag(BlockId(2));
        assert_eq!(dragged(&session), vec![BlockId(2)]);
        session.end_drag(BlockId(2));
        assert!(dragged(&session).is_empty());
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        let mut bodies = HeadlessBodies::new();
        let settings = Settings {
            new_block_x: 700..=100,
            ..Default::default()
        };
        let mut session = Session::new(settings, &mut bodies);
        assert_eq!(session.settings, Settings::default());

        session.start(&mut bodies);
        let id = session.add_block(&mut bodies).expect("block spawns with default ranges");
        let x = session.registry.get(id).unwrap().pos.x;
        assert!((100.0..=700.0).contains(&x));
    }

    #[test]
    fn oversized_seed_count_falls_back_to_defaults() {
        let mut bodies = HeadlessBodies::new();
        let settings = Settings {
            initial_blocks: 9,
            ..Default::default()
        };
        let session = Session::new(settings, &mut bodies);
        assert_eq!(session.settings.initial_blocks, INITIAL_BLOCKS);
        assert_eq!(session.registry.len(), INITIAL_BLOCKS);
    }

    #[test]
    fn undrained_events_are_capped() {
        let (mut session, mut bodies) = session();
        for _ in 0..MAX_QUEUED_EVENTS + 10 {
            session.restart(&mut bodies);
        }
        session.start(&mut bodies);
        let events = session.drain_events();
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        assert_eq!(events.last(), Some(&GameEvent::Started));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn game_over_freezes_and_reports() {
        let (mut session, mut bodies) = session();
        session.start(&mut bodies);
        let id = session.add_block(&mut bodies).unwrap();
        session.drain_events();

        bodies.place(id, Vec2::new(400.0, 40.0), Vec2::ZERO);
        bodies.set_sleeping(id, true);
        session.sync_bodies(&bodies);

        assert!(session.poll_game_over());
        assert_eq!(session.phase, SessionPhase::Over);
        let height = session.metrics.current_height;
        assert_eq!(session.best.best_height, height);

        let events = session.drain_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            GameEvent::GameOver {
                best_height,
                final_score,
                blocks_used,
            } => {
                assert_eq!(*best_height, height);
                assert_eq!(*blocks_used, 6);
                assert_eq!(*final_score, crate::sim::metrics::efficiency(height, 6));
            }
            other => panic!("unexpected event {:?}", other),
        }

        // No more blocks, no second game over
        assert_eq!(session.add_block(&mut bodies), None);
        assert!(!session.poll_game_over());
    }

    #[test]
    fn restart_reseeds_and_clears_records() {
        let (mut session, mut bodies) = session();
        session.start(&mut bodies);
        session.add_block(&mut bodies);
        session.best.best_height = 300;
        session.timer.begin(0.0);

        session.restart(&mut bodies);
        assert_eq!(session.phase, SessionPhase::NotStarted);
        assert_eq!(session.registry.len(), 5);
        assert_eq!(bodies.len(), 5);
        assert_eq!(session.best, BestRecord::default());
        assert!(!session.timer.is_settling());
        assert!(session.registry.iter().all(|b| b.is_static));
        assert_eq!(session.drain_events().last(), Some(&GameEvent::Restarted));
    }
}
