//! The engine aggregate and the helpers every system shares.
//!
//! [`Engine`] owns the world store and the definition catalog, and holds
//! handles to the two concurrent structures (session registry) and the
//! persistence collaborator. Only the tick thread ever mutates it.

use std::sync::Arc;

use orrery_ecs::prelude::{Entity, World};

use crate::account::AccountStore;
use crate::catalog::Catalog;
use crate::components::{
    Controlling, Description, LandPosition, Player, Ship, SpacePosition,
};
use crate::session::SessionRegistry;

pub struct Engine {
    pub world: World,
    pub catalog: Catalog,
    pub sessions: Arc<SessionRegistry>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Engine {
    pub fn new(sessions: Arc<SessionRegistry>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            world: World::new(),
            catalog: Catalog::new(),
            sessions,
            accounts,
        }
    }

    /// The entity a session's commands act through: the player entity
    /// itself, or the target of its controlling relation.
    pub fn acting_entity(&self, player_entity: Entity) -> Entity {
        match self.world.get::<Controlling>(player_entity) {
            Some(controlling) => controlling.target,
            None => player_entity,
        }
    }

    /// Display name for messages: ship name, else player name, else short
    /// description, else "Unknown".
    pub fn display_name(&self, entity: Entity) -> String {
        if let Some(ship) = self.world.get::<Ship>(entity) {
            return ship.name.clone();
        }
        if let Some(player) = self.world.get::<Player>(entity) {
            return player.name.clone();
        }
        if let Some(desc) = self.world.get::<Description>(entity) {
            return desc.short.clone();
        }
        "Unknown".to_string()
    }

    /// Whether `entity` is a player avatar or some player's piloted vehicle.
    pub fn is_player_controlled(&self, entity: Entity) -> bool {
        if self.world.has::<Player>(entity) {
            return true;
        }
        self.world
            .query()
            .with::<Player>()
            .with::<Controlling>()
            .entities()
            .into_iter()
            .any(|p| {
                self.world
                    .get::<Controlling>(p)
                    .is_some_and(|c| c.target == entity)
            })
    }

    /// Euclidean distance between two entities sharing a topology: 3D
    /// within the same sector, 2D within the same zone. `None` means the
    /// two cannot reach each other (different sector/zone, or mixed
    /// topologies).
    pub fn distance(&self, a: Entity, b: Entity) -> Option<f64> {
        if let (Some(pa), Some(pb)) = (
            self.world.get::<SpacePosition>(a),
            self.world.get::<SpacePosition>(b),
        ) {
            if pa.sector_id != pb.sector_id {
                return None;
            }
            let (dx, dy, dz) = (pa.x - pb.x, pa.y - pb.y, pa.z - pb.z);
            return Some((dx * dx + dy * dy + dz * dz).sqrt());
        }
        if let (Some(pa), Some(pb)) = (
            self.world.get::<LandPosition>(a),
            self.world.get::<LandPosition>(b),
        ) {
            if pa.zone_id != pb.zone_id {
                return None;
            }
            let (dx, dy) = ((pa.x - pb.x) as f64, (pa.y - pb.y) as f64);
            return Some((dx * dx + dy * dy).sqrt());
        }
        None
    }

    /// Deliver a line to whoever is behind `entity`: its own connection if
    /// it is a player avatar, and the connection of any player controlling
    /// it. Sends are non-blocking; sessions are snapshotted first so no
    /// registry guard is held while lines go out.
    pub fn send_to_entity(&self, entity: Entity, line: &str) {
        if let Some(player) = self.world.get::<Player>(entity) {
            if !player.connection_id.is_empty() {
                if let Some(view) = self.sessions.view(&player.connection_id) {
                    view.conn.send(line);
                }
            }
        }

        let pilots = self
            .world
            .query()
            .with::<Player>()
            .with::<Controlling>()
            .entities();
        for pilot in pilots {
            let controls_entity = self
                .world
                .get::<Controlling>(pilot)
                .is_some_and(|c| c.target == entity);
            if !controls_entity {
                continue;
            }
            if let Some(player) = self.world.get::<Player>(pilot) {
                if let Some(view) = self.sessions.view(&player.connection_id) {
                    view.conn.send(line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryStore;
    use crate::components::Health;

    fn engine() -> Engine {
        Engine::new(Arc::new(SessionRegistry::new()), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn acting_entity_follows_controlling_relation() {
        let mut engine = engine();
        let ship = engine.world.spawn((Ship {
            name: "Tug".into(),
            hull: 10.0,
            max_hull: 10.0,
            shields: 0.0,
            max_shields: 0.0,
        },));
        let pilot = engine.world.spawn((
            Player {
                name: "kirk".into(),
                connection_id: "c1".into(),
            },
            Controlling { target: ship },
        ));
        let walker = engine.world.spawn((Player {
            name: "bones".into(),
            connection_id: "c2".into(),
        },));

        assert_eq!(engine.acting_entity(pilot), ship);
        assert_eq!(engine.acting_entity(walker), walker);
    }

    #[test]
    fn display_name_resolution_order() {
        let mut engine = engine();
        let ship = engine.world.spawn((
            Ship {
                name: "Defiant".into(),
                hull: 1.0,
                max_hull: 1.0,
                shields: 0.0,
                max_shields: 0.0,
            },
            Description {
                short: "a warship".into(),
                long: String::new(),
            },
        ));
        let rat = engine.world.spawn((
            Description {
                short: "Rat".into(),
                long: "A large sewer rat.".into(),
            },
            Health {
                current: 5,
                max: 5,
            },
        ));
        let nameless = engine.world.spawn_empty();

        assert_eq!(engine.display_name(ship), "Defiant");
        assert_eq!(engine.display_name(rat), "Rat");
        assert_eq!(engine.display_name(nameless), "Unknown");
    }

    #[test]
    fn player_controlled_covers_both_login_models() {
        let mut engine = engine();
        let avatar = engine.world.spawn((Player {
            name: "kirk".into(),
            connection_id: "c1".into(),
        },));
        let ship = engine.world.spawn((Ship {
            name: "Tug".into(),
            hull: 1.0,
            max_hull: 1.0,
            shields: 0.0,
            max_shields: 0.0,
        },));
        let _pilot = engine.world.spawn((
            Player {
                name: "sulu".into(),
                connection_id: "c2".into(),
            },
            Controlling { target: ship },
        ));
        let mob = engine.world.spawn_empty();

        assert!(engine.is_player_controlled(avatar));
        assert!(engine.is_player_controlled(ship));
        assert!(!engine.is_player_controlled(mob));
    }

    #[test]
    fn distance_requires_shared_topology() {
        let mut engine = engine();
        let a = engine.world.spawn((SpacePosition {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            sector_id: "Alpha".into(),
        },));
        let b = engine.world.spawn((SpacePosition {
            x: 3.0,
            y: 4.0,
            z: 0.0,
            sector_id: "Alpha".into(),
        },));
        let c = engine.world.spawn((SpacePosition {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            sector_id: "Beta".into(),
        },));
        let d = engine.world.spawn((LandPosition {
            x: 0,
            y: 0,
            zone_id: "Earth".into(),
        },));

        assert_eq!(engine.distance(a, b), Some(5.0));
        assert_eq!(engine.distance(a, c), None, "different sector");
        assert_eq!(engine.distance(a, d), None, "mixed topology");
    }
}
