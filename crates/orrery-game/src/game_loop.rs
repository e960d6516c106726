//! The fixed-rate game loop.
//!
//! A single dedicated thread drives the whole simulation; it is the only
//! mutator of the world store and gameplay state. Each tick, in order:
//!
//! 1. Drain the command queue completely (including lines enqueued during
//!    the drain) through the interpreter.
//! 2. Run the Mob AI system.
//! 3. Run the Combat system.
//! 4. Autosave every in-game session when the interval elapses.
//! 5. Sleep whatever remains of the tick period. An overrunning tick is
//!    logged and the next tick starts immediately -- ticks are never
//!    skipped, only the idle wait is.
//!
//! Simulation time is sampled from a monotonic clock once per tick and
//! passed into every system as absolute milliseconds, so the systems are
//! pure functions of `(world, now)` and directly testable.
//!
//! Shutdown is cooperative: the flag is observed at tick boundaries only,
//! never mid-tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command;
use crate::engine::Engine;
use crate::session::{CommandQueue, SessionState};
use crate::{combat, mob_ai};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Tick period. Must be non-zero.
    pub tick_interval: Duration,
    /// How often to persist every in-game session.
    pub autosave_interval: Duration,
}

impl Default for LoopConfig {
    /// 20 Hz ticks, five-minute autosave.
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            autosave_interval: Duration::from_secs(5 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// GameLoop
// ---------------------------------------------------------------------------

pub struct GameLoop {
    engine: Engine,
    queue: Arc<CommandQueue>,
    config: LoopConfig,
    shutdown: Arc<AtomicBool>,
    started: Instant,
    last_autosave: Instant,
    ticks: u64,
}

impl GameLoop {
    pub fn new(engine: Engine, queue: Arc<CommandQueue>, config: LoopConfig) -> Self {
        assert!(
            config.tick_interval > Duration::ZERO,
            "tick_interval must be non-zero"
        );
        Self {
            engine,
            queue,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
            last_autosave: Instant::now(),
            ticks: 0,
        }
    }

    /// Flag observed at each tick boundary; flip it to stop the loop.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Setup-time access to the engine, before the loop thread starts.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Milliseconds of simulation time since the loop was created.
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Run until the shutdown flag flips. Blocks the calling thread.
    pub fn run(&mut self) {
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "game loop started"
        );

        while !self.shutdown.load(Ordering::Relaxed) {
            let tick_start = Instant::now();
            let now = self.now_ms();
            self.tick(now);

            let elapsed = tick_start.elapsed();
            if elapsed < self.config.tick_interval {
                thread::sleep(self.config.tick_interval - elapsed);
            } else {
                warn!(
                    tick = self.ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "tick overran its period"
                );
            }
        }

        info!(ticks = self.ticks, "game loop stopped");
    }

    /// One full tick at simulation time `now`. Public so tests can step the
    /// pipeline deterministically.
    pub fn tick(&mut self, now: u64) {
        self.ticks += 1;

        // 1. Commands. Draining until empty also consumes lines enqueued
        // while we drain; producers never wait on us.
        while let Some(cmd) = self.queue.pop() {
            if let Err(err) = command::apply(&mut self.engine, &cmd.connection_id, &cmd.line, now)
            {
                warn!(connection = %cmd.connection_id, %err, "command failed");
            }
        }

        // 2-3. Systems, in fixed order.
        mob_ai::run(&mut self.engine, now);
        combat::run(&mut self.engine, now);

        // 4. Maintenance.
        if self.last_autosave.elapsed() >= self.config.autosave_interval {
            self.autosave();
            self.last_autosave = Instant::now();
        }
    }

    /// Synchronously persist every in-game session. Runs inside the tick on
    /// purpose: in-flight mutation of an entity during its own save is
    /// impossible under the single-writer rule.
    fn autosave(&mut self) {
        info!("autosaving players");
        for view in self.engine.sessions.views() {
            if view.state != SessionState::InGame {
                continue;
            }
            match command::persist::save_session(&mut self.engine, &view) {
                Ok(()) => debug!(connection = %view.connection_id, "autosaved"),
                Err(err) => {
                    // One account's failure never takes down the world.
                    warn!(connection = %view.connection_id, %err, "autosave failed");
                    view.conn.send("Save failed; your progress may not persist.");
                }
            }
        }
    }
}
