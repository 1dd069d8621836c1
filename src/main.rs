//! Crate Stacker headless driver
//!
//! Runs a scripted session against the in-memory body store: starts the run,
//! keeps dropping new containers onto the tower and logs what the core
//! reports until the tower tops out or time runs out.
//!
//! Usage:
//!   cargo run -- --blocks 12
//!   RUST_LOG=debug cargo run -- --seed 7 --json

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use crate_stacker::Settings;
use crate_stacker::consts::{FRAME_MS, WORLD_WIDTH};
use crate_stacker::sim::{
    BlockId, GameEvent, HeadlessBodies, Session, SessionPhase, TickInput, tick,
};

/// How often the script presses "add block" (ms)
const ADD_EVERY_MS: f64 = 8000.0;
/// Downward nudge given to a container dropped on the tower
const DROP_SPEED: f32 = 0.2;

#[derive(Parser)]
#[command(version, about = "Headless run of the Crate Stacker stability and scoring core")]
struct Cli {
    /// JSON settings file (missing fields use defaults)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Containers to add before stopping
    #[arg(long, default_value_t = 12)]
    blocks: u32,

    /// Simulated time limit in seconds
    #[arg(long, default_value_t = 180.0)]
    max_seconds: f64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

/// Driver state
struct Demo {
    session: Session,
    bodies: HeadlessBodies,
    input: TickInput,
    frame: u64,
    added: u32,
    last_add_ms: f64,
}

impl Demo {
    fn new(settings: Settings) -> Self {
        let mut bodies = HeadlessBodies::new();
        let session = Session::new(settings, &mut bodies);
        Self {
            session,
            bodies,
            input: TickInput::default(),
            frame: 0,
            added: 0,
            last_add_ms: 0.0,
        }
    }

    fn now_ms(&self) -> f64 {
        self.frame as f64 * FRAME_MS
    }

    /// Decide this frame's input
    fn script(&mut self, max_blocks: u32) {
        let now = self.now_ms();
        if self.frame == 0 {
            self.input.pointer_down = true;
        }
        if self.session.snapshot().can_add_block
            && self.added < max_blocks
            && now - self.last_add_ms >= ADD_EVERY_MS
        {
            self.input.add_block = true;
            self.last_add_ms = now;
        }
    }

    /// Put a freshly spawned container on top of the tower
    fn drop_on_tower(&mut self, id: BlockId) {
        let cutoff = self.session.settings.offscreen_cutoff_y;
        let top = self
            .session
            .registry
            .visible(cutoff)
            .filter(|b| b.id != id)
            .map(|b| b.top_edge())
            .fold(self.session.settings.baseline_y, f32::min);
        let Some(size) = self.bodies.size(id) else {
            return;
        };
        let pos = Vec2::new(WORLD_WIDTH / 2.0, top - size.y / 2.0);
        self.bodies.place(id, pos, Vec2::new(0.0, DROP_SPEED));
    }

    /// Run one frame
    fn update(&mut self, max_blocks: u32) -> bool {
        self.script(max_blocks);

        let now = self.now_ms();
        let input = std::mem::take(&mut self.input);
        tick(&mut self.session, &mut self.bodies, &input, now);
        self.bodies.step((FRAME_MS / 1000.0) as f32);
        self.frame += 1;

        let mut over = false;
        for event in self.session.drain_events() {
            match event {
                GameEvent::BlockAdded { id } => {
                    self.added += 1;
                    self.drop_on_tower(id);
                }
                GameEvent::GameOver { .. } => over = true,
                _ => {}
            }
        }
        !over
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.settings.as_deref());
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    let mut demo = Demo::new(settings);
    let max_ms = cli.max_seconds * 1000.0;
    while demo.now_ms() < max_ms && demo.update(cli.blocks) {}

    let snapshot = demo.session.snapshot();
    log::info!(
        "Finished after {:.1}s ({:?}): height {} px, best {} px, best score {}, {} containers",
        demo.now_ms() / 1000.0,
        snapshot.phase,
        snapshot.current_height,
        snapshot.best_height,
        snapshot.best_score,
        snapshot.visible_blocks
    );
    if snapshot.phase != SessionPhase::Over {
        log::info!("Tower never topped out");
    }

    if cli.json {
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to encode snapshot: {}", e),
        }
    }
}
