//! Orrery ECS -- generational entity arena with sparse component columns.
//!
//! This crate is the world store for the Orrery simulation engine. Entities
//! are opaque generation-checked handles into a slot arena; components are
//! typed values held in per-type sparse columns; capability is always the
//! *set of components present*, tested at runtime, never a type hierarchy.
//!
//! # Quick Start
//!
//! ```
//! use orrery_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: i32, y: i32 }
//!
//! #[derive(Debug, PartialEq)]
//! struct Frozen;
//!
//! let mut world = World::new();
//! let e = world.spawn((Position { x: 0, y: 0 },));
//!
//! assert_eq!(world.get::<Position>(e), Some(&Position { x: 0, y: 0 }));
//! assert_eq!(world.query().with::<Position>().without::<Frozen>().entities(), vec![e]);
//!
//! world.despawn(e);
//! assert!(!world.is_alive(e));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world-store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The handle's generation no longer matches its slot (destroyed, or
    /// never allocated).
    #[error("entity {0} is stale or was never allocated")]
    StaleEntity(entity::Entity),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{Entities, Entity};
    pub use crate::world::{Bundle, Query, World};
    pub use crate::EcsError;
}
