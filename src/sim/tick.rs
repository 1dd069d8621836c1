//! Per-tick pipeline
//!
//! Runs once per rendering frame on the simulation thread:
//! input -> physics sync -> stability -> height/score -> game-over poll ->
//! snapshot. The session phase gates which stages run.

use super::block::BlockId;
use super::physics::PhysicsBodies;
use super::session::{Session, SessionPhase};

/// Input gathered since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Any pointer press (starts an unstarted session)
    pub pointer_down: bool,
    /// Pointer picked up a block
    pub drag_start: Option<BlockId>,
    /// Pointer released a block
    pub drag_end: Option<BlockId>,
    /// "Add block" pressed
    pub add_block: bool,
    /// "Restart" pressed
    pub restart: bool,
    /// The engine reported a new block/ground contact this step
    pub contact_started: bool,
}

/// Advance the session to `now_ms`
pub fn tick<P: PhysicsBodies>(
    session: &mut Session,
    bodies: &mut P,
    input: &TickInput,
    now_ms: f64,
) {
    session.time_ms = now_ms;

    if input.restart {
        session.restart(bodies);
        return;
    }

    if input.pointer_down && session.phase == SessionPhase::NotStarted {
        session.start(bodies);
    }

    match session.phase {
        SessionPhase::NotStarted => {}
        SessionPhase::Running => {
            if let Some(id) = input.drag_end {
                session.end_drag(id);
            }
            if let Some(id) = input.drag_start {
                session.begin_drag(id);
            }
            if input.add_block {
                session.add_block(bodies);
            }

            session.sync_bodies(bodies);

            // Fresh impacts void any window in flight
            if input.contact_started {
                session.timer.reset();
            }

            session.run_pipeline(now_ms);

            if session.game_over_poll.ready(now_ms) {
                session.poll_game_over();
            }
        }
        SessionPhase::Over => {
            // Frozen scoring, live bodies for display
            session.sync_bodies(bodies);
        }
    }

    session.publish_snapshot();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::settings::Settings;
    use crate::sim::metrics::efficiency;
    use crate::sim::physics::HeadlessBodies;
    use crate::sim::session::GameEvent;
    use glam::Vec2;

    fn new_game() -> (Session, HeadlessBodies) {
        let mut bodies = HeadlessBodies::new();
        let session = Session::new(Settings::default(), &mut bodies);
        (session, bodies)
    }

    fn confirmations(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::TowerConfirmedStable { .. }))
            .count()
    }

    #[test]
    fn test_pipeline_idle_until_started() {
        let (mut session, mut bodies) = new_game();
        let add = TickInput {
            add_block: true,
            ..Default::default()
        };
        for i in 0..300 {
            tick(&mut session, &mut bodies, &add, i as f64 * 10.0);
        }
        assert_eq!(session.phase, SessionPhase::NotStarted);
        assert_eq!(session.registry.len(), 5);
        assert!(!session.timer.is_settling());
        assert!(session.drain_events().is_empty());
        assert_eq!(session.snapshot().current_height, 0);
    }

    #[test]
    fn test_end_to_end_confirm_then_add() {
        let (mut session, mut bodies) = new_game();

        // First interaction starts the run; the still tower opens a window
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);
        assert_eq!(session.phase, SessionPhase::Running);
        assert!(session.timer.is_settling());
        for block in session.registry.iter() {
            assert!(!bodies.body(block.id).unwrap().is_static);
        }

        let idle = TickInput::default();
        let mut events = session.drain_events();
        let mut t = 0.0;
        while t < 3000.0 {
            t += 100.0;
            bodies.step(0.1);
            tick(&mut session, &mut bodies, &idle, t);
            events.extend(session.drain_events());
        }
        assert_eq!(events.first(), Some(&GameEvent::Started));
        assert_eq!(confirmations(&events), 1);

        let height = session.metrics.current_height;
        assert_eq!(height, 170);
        assert_eq!(session.best.best_height, height);
        assert_eq!(session.best.best_score, 34.0);
        assert_eq!(session.snapshot().best_height, height);

        // Adding a block rescales the score at once, no confirmation needed
        let before = session.metrics.visible_blocks;
        let add = TickInput {
            add_block: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &add, t + 100.0);
        let snap = session.snapshot();
        assert_eq!(snap.visible_blocks, before + 1);
        assert_eq!(
            snap.efficiency_score,
            efficiency(snap.current_height, snap.visible_blocks)
        );
        assert!(snap.current_height > height);
        assert_eq!(snap.best_height, height);
        assert_eq!(confirmations(&session.drain_events()), 0);
    }

    #[test]
    fn test_unstable_tick_restarts_window() {
        let (mut session, mut bodies) = new_game();
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);

        let idle = TickInput::default();
        let mut t = 0.0;
        while t < 2000.0 {
            t += 100.0;
            tick(&mut session, &mut bodies, &idle, t);
        }
        assert!(session.snapshot().stability_progress_pct > 60.0);

        // One wobble
        bodies.set_velocity(BlockId(5), Vec2::new(0.5, 0.0));
        t += 100.0;
        tick(&mut session, &mut bodies, &idle, t);
        assert!(!session.snapshot().is_stable);
        assert_eq!(session.snapshot().stability_progress_pct, 0.0);
        bodies.set_velocity(BlockId(5), Vec2::ZERO);

        let restart_at = t + 100.0;
        let mut confirmed_at = None;
        while confirmed_at.is_none() && t < 10_000.0 {
            t += 100.0;
            tick(&mut session, &mut bodies, &idle, t);
            if confirmations(&session.drain_events()) > 0 {
                confirmed_at = Some(t);
            }
        }
        assert_eq!(confirmed_at, Some(restart_at + 3000.0));
    }

    #[test]
    fn test_drag_disqualifies_slow_block() {
        let (mut session, mut bodies) = new_game();
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);

        let grab = TickInput {
            drag_start: Some(BlockId(3)),
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &grab, FRAME_MS);
        assert!(!session.verdict.settled);
        assert_eq!(session.verdict.stable_blocks, 4);
        assert!(!session.timer.is_settling());

        let release = TickInput {
            drag_end: Some(BlockId(3)),
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &release, 2.0 * FRAME_MS);
        assert!(session.verdict.settled);
        assert!(session.timer.is_settling());
    }

    #[test]
    fn test_contact_voids_window() {
        let (mut session, mut bodies) = new_game();
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);
        tick(&mut session, &mut bodies, &TickInput::default(), 1500.0);
        assert_eq!(session.timer.progress_pct(), 50.0);

        let bump = TickInput {
            contact_started: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &bump, 1600.0);
        // Window reopened on the contact tick
        assert_eq!(session.timer.progress_pct(), 0.0);
        assert!(session.timer.is_settling());
    }

    #[test]
    fn test_game_over_needs_sleeping_block_on_poll() {
        let (mut session, mut bodies) = new_game();
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);
        let add = TickInput {
            add_block: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &add, 100.0);
        let id = session.registry.ids()[5];

        // Fast block above the line: poll passes without ending the run
        bodies.place(id, Vec2::new(400.0, 30.0), Vec2::new(0.0, -40.0));
        let idle = TickInput::default();
        tick(&mut session, &mut bodies, &idle, 1000.0);
        tick(&mut session, &mut bodies, &idle, 1100.0);
        assert_eq!(session.phase, SessionPhase::Running);

        // Asleep above the line, but the next poll is not due yet
        bodies.place(id, Vec2::new(400.0, 30.0), Vec2::ZERO);
        bodies.set_sleeping(id, true);
        tick(&mut session, &mut bodies, &idle, 1500.0);
        assert_eq!(session.phase, SessionPhase::Running);

        tick(&mut session, &mut bodies, &idle, 2100.0);
        assert_eq!(session.phase, SessionPhase::Over);
        let events = session.drain_events();
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver { blocks_used: 6, .. })
        ));
        assert!(!session.snapshot().can_add_block);

        // Over: add is ignored, pipeline frozen
        tick(&mut session, &mut bodies, &add, 2200.0);
        assert_eq!(session.registry.len(), 6);
        assert!(!session.timer.is_settling());
    }

    #[test]
    fn test_restart_from_over() {
        let (mut session, mut bodies) = new_game();
        let start = TickInput {
            pointer_down: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &start, 0.0);
        tick(&mut session, &mut bodies, &TickInput::default(), 3000.0);
        assert_eq!(session.best.best_height, 170);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut session, &mut bodies, &restart, 3100.0);
        assert_eq!(session.phase, SessionPhase::NotStarted);
        assert_eq!(session.best.best_height, 0);
        assert_eq!(session.snapshot().blocks.len(), 5);
        assert_eq!(session.drain_events().last(), Some(&GameEvent::Restarted));
    }
}
