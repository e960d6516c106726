//! The [`World`] owns the entity arena and all component storage.
//!
//! Components live in per-type *columns*: ordered maps keyed by entity slot.
//! Capability checks are presence tests (`has::<Weapon>`), never type
//! inspection. Queries enumerate entities whose component set satisfies an
//! all-of/none-of predicate and always return a **materialized** list in
//! ascending slot order, so callers can mutate structurally while walking
//! the result without invalidating their own iteration.
//!
//! The world performs no locking. It assumes a single writer; concurrency
//! discipline is the simulation loop's responsibility.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use crate::entity::{Entities, Entity};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Columns -- per-type sparse storage
// ---------------------------------------------------------------------------

/// Type-erased view of a column, enough for despawn sweeps and presence
/// tests without knowing `T`.
trait AnyColumn: Send + Sync {
    fn contains(&self, slot: u32) -> bool;
    fn remove_slot(&mut self, slot: u32);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse storage for one component type, keyed by entity slot.
///
/// A `BTreeMap` keeps slots ordered, which is what makes query results (and
/// therefore system execution order) deterministic.
struct Column<T> {
    cells: BTreeMap<u32, T>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }
}

impl<T: Send + Sync + 'static> AnyColumn for Column<T> {
    fn contains(&self, slot: u32) -> bool {
        self.cells.contains_key(&slot)
    }

    fn remove_slot(&mut self, slot: u32) {
        self.cells.remove(&slot);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Bundle -- spawn an entity with a component set in one call
// ---------------------------------------------------------------------------

/// A set of components that can be attached to a freshly spawned entity.
///
/// Implemented for tuples of components, so call sites read like the
/// entity's archetype: `world.spawn((Description { .. }, Health { .. }))`.
pub trait Bundle {
    fn attach(self, world: &mut World, entity: Entity);
}

impl Bundle for () {
    fn attach(self, _world: &mut World, _entity: Entity) {}
}

macro_rules! impl_bundle_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Send + Sync + 'static),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn attach(self, world: &mut World, entity: Entity) {
                let ($($name,)+) = self;
                $(world.insert_raw(entity, $name);)+
            }
        }
    };
}

impl_bundle_for_tuple!(A);
impl_bundle_for_tuple!(A, B);
impl_bundle_for_tuple!(A, B, C);
impl_bundle_for_tuple!(A, B, C, D);
impl_bundle_for_tuple!(A, B, C, D, E);
impl_bundle_for_tuple!(A, B, C, D, E, F);
impl_bundle_for_tuple!(A, B, C, D, E, F, G);
impl_bundle_for_tuple!(A, B, C, D, E, F, G, H);
impl_bundle_for_tuple!(A, B, C, D, E, F, G, H, I);
impl_bundle_for_tuple!(A, B, C, D, E, F, G, H, I, J);

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Arena of entities plus all component columns.
#[derive(Default)]
pub struct World {
    entities: Entities,
    columns: HashMap<TypeId, Box<dyn AnyColumn>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // -- structural ---------------------------------------------------------

    /// Spawn an entity carrying `bundle`'s components.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.entities.alloc();
        bundle.attach(self, entity);
        entity
    }

    /// Spawn an entity with no components.
    pub fn spawn_empty(&mut self) -> Entity {
        self.entities.alloc()
    }

    /// Destroy an entity and drop all of its components.
    ///
    /// Idempotent: a stale or already-destroyed handle returns `false` and
    /// changes nothing.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            return false;
        }
        let slot = entity.index();
        for column in self.columns.values_mut() {
            column.remove_slot(slot);
        }
        true
    }

    /// `true` iff the handle refers to a currently live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- components ---------------------------------------------------------

    /// Attach `value` to `entity`, overwriting any existing `T`.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        self.insert_raw(entity, value);
        Ok(())
    }

    /// Insert without the liveness check. Only for freshly spawned entities.
    fn insert_raw<T: Send + Sync + 'static>(&mut self, entity: Entity, value: T) {
        let column = self
            .columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::default()));
        let column = column
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .expect("column type registered under a different TypeId");
        column.cells.insert(entity.index(), value);
    }

    /// Detach and return `entity`'s `T`, if present.
    pub fn remove<T: Send + Sync + 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.cells.remove(&entity.index())
    }

    /// `true` iff a live `entity` carries a `T`.
    pub fn has<T: Send + Sync + 'static>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
            && self
                .column::<T>()
                .is_some_and(|c| c.cells.contains_key(&entity.index()))
    }

    /// Borrow `entity`'s `T`. `None` means dead entity or absent component;
    /// callers that need to distinguish check [`has`](Self::has) first.
    pub fn get<T: Send + Sync + 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.column::<T>()?.cells.get(&entity.index())
    }

    /// Mutably borrow `entity`'s `T`. This is also the overwrite path the
    /// gameplay code uses for in-place updates.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.cells.get_mut(&entity.index())
    }

    fn column<T: Send + Sync + 'static>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|c| c.as_any().downcast_ref::<Column<T>>())
    }

    fn column_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.as_any_mut().downcast_mut::<Column<T>>())
    }

    // -- queries ------------------------------------------------------------

    /// Start a predicate query. Terminal [`Query::entities`] evaluates it
    /// fresh against the current world state.
    pub fn query(&self) -> Query<'_> {
        Query {
            world: self,
            with: Vec::new(),
            without: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// An all-of/none-of component predicate over the world.
///
/// `entities()` is a point-in-time enumeration, not a live view: the result
/// is a plain `Vec` that stays valid (as a list of handles) across any
/// structural mutation -- though individual handles may of course die.
pub struct Query<'w> {
    world: &'w World,
    with: Vec<TypeId>,
    without: Vec<TypeId>,
}

impl Query<'_> {
    /// Require component `T`.
    pub fn with<T: Send + Sync + 'static>(mut self) -> Self {
        self.with.push(TypeId::of::<T>());
        self
    }

    /// Exclude entities carrying component `T`.
    pub fn without<T: Send + Sync + 'static>(mut self) -> Self {
        self.without.push(TypeId::of::<T>());
        self
    }

    /// Evaluate the predicate now, returning matches in ascending slot order.
    pub fn entities(self) -> Vec<Entity> {
        let world = self.world;
        world
            .entities
            .iter()
            .filter(|entity| {
                let slot = entity.index();
                self.with
                    .iter()
                    .all(|t| world.columns.get(t).is_some_and(|c| c.contains(slot)))
                    && !self
                        .without
                        .iter()
                        .any(|t| world.columns.get(t).is_some_and(|c| c.contains(slot)))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
