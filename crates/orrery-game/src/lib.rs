//! Orrery game core -- the shared-world simulation engine.
//!
//! This crate builds on [`orrery_ecs`] to provide everything between the
//! transport layer and the world store: the command queue and session
//! registry (the only concurrent structures), the command interpreter, the
//! per-tick combat and mob-AI systems, the kill-driven quest reactor, the
//! content loader, the account persistence collaborator, and the
//! fixed-rate game loop that is the world's single writer.
//!
//! # Wiring
//!
//! ```
//! use std::sync::Arc;
//! use orrery_game::prelude::*;
//!
//! let sessions = Arc::new(SessionRegistry::new());
//! let queue = Arc::new(CommandQueue::new());
//! let accounts = Arc::new(MemoryStore::new());
//!
//! let mut engine = Engine::new(Arc::clone(&sessions), accounts);
//! orrery_game::content::populate(&mut engine, &orrery_game::content::default_population());
//!
//! let mut game_loop = GameLoop::new(engine, Arc::clone(&queue), LoopConfig::default());
//! // A transport registers connections in `sessions`, pushes lines into
//! // `queue`, and `game_loop.run()` drives the world on its own thread.
//! game_loop.tick(0);
//! ```

#![deny(unsafe_code)]

pub mod account;
pub mod catalog;
pub mod combat;
pub mod command;
pub mod components;
pub mod content;
pub mod engine;
pub mod game_loop;
pub mod mob_ai;
pub mod net;
pub mod quest;
pub mod session;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the world-store crate for convenience.
pub use orrery_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use orrery_ecs::prelude::*;

    pub use crate::account::{Account, AccountItem, AccountStore, MemoryStore};
    pub use crate::catalog::{Catalog, QuestDef, QuestType, SkillDef, SkillType};
    pub use crate::components::*;
    pub use crate::engine::Engine;
    pub use crate::game_loop::{GameLoop, LoopConfig};
    pub use crate::net::Connection;
    pub use crate::session::{
        CommandQueue, InboundCommand, Session, SessionRegistry, SessionState, SessionView,
    };
}
