//! Entity handles and slot allocation.
//!
//! An [`Entity`] is a 64-bit handle packing a *generation* counter in the
//! high 32 bits and a slot *index* in the low 32 bits. Destroying an entity
//! bumps the slot's generation, so every handle issued before the destroy
//! stays detectably dead forever -- even after the slot is recycled for a new
//! entity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A generational entity handle.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// Build a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` form, for logs and durable references.
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.0
    }

    /// Reconstruct a handle from its raw form.
    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// Entities -- the slot arena
// ---------------------------------------------------------------------------

/// Allocates and recycles entity slots with generational tracking.
///
/// Freed slots go to the back of a FIFO queue, spreading generation bumps
/// across slots instead of hammering one hot index.
#[derive(Debug, Default)]
pub struct Entities {
    /// Current generation per slot.
    generations: Vec<u32>,
    /// Liveness flag per slot.
    alive: Vec<bool>,
    /// Recyclable slots, oldest first.
    free: VecDeque<u32>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle, recycling the oldest freed slot if any.
    pub fn alloc(&mut self) -> Entity {
        if let Some(index) = self.free.pop_front() {
            // Generation was already bumped when the slot was freed.
            self.alive[index as usize] = true;
            Entity::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        }
    }

    /// Free the entity's slot and bump its generation.
    ///
    /// Returns `false` (and does nothing) if the handle is stale or already
    /// freed, making destruction idempotent.
    pub fn free(&mut self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        if !self.is_alive(entity) {
            return false;
        }
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push_back(entity.index());
        true
    }

    /// `true` iff the handle's generation matches the slot's current
    /// generation and the slot is live.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == entity.generation()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live handles in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &a)| a)
            .map(|(i, _)| Entity::new(i as u32, self.generations[i]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_yields_unique_indices() {
        let mut entities = Entities::new();
        let mut indices: Vec<u32> = (0..64).map(|_| entities.alloc().index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 64);
    }

    #[test]
    fn recycled_slot_gets_new_generation() {
        let mut entities = Entities::new();
        let a = entities.alloc();
        assert!(entities.free(a));
        let b = entities.alloc();
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
    }

    #[test]
    fn stale_handle_stays_dead_across_reuse() {
        let mut entities = Entities::new();
        let a = entities.alloc();
        entities.free(a);
        assert!(!entities.is_alive(a));
        let b = entities.alloc();
        assert_eq!(b.index(), a.index());
        assert!(!entities.is_alive(a), "old handle must stay dead forever");
        assert!(entities.is_alive(b));
    }

    #[test]
    fn double_free_is_a_no_op() {
        let mut entities = Entities::new();
        let a = entities.alloc();
        assert!(entities.free(a));
        assert!(!entities.free(a));
        assert_eq!(entities.len(), 0);
    }

    #[test]
    fn iter_is_ordered_and_live_only() {
        let mut entities = Entities::new();
        let a = entities.alloc();
        let b = entities.alloc();
        let c = entities.alloc();
        entities.free(b);
        let live: Vec<Entity> = entities.iter().collect();
        assert_eq!(live, vec![a, c]);
    }

    #[test]
    fn handle_bits_roundtrip() {
        let e = Entity::new(17, 3);
        assert_eq!(Entity::from_bits(e.to_bits()), e);
        assert_eq!(e.index(), 17);
        assert_eq!(e.generation(), 3);
    }
}
