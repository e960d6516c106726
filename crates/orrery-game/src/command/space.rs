//! The land/launch transition between the two location topologies.
//!
//! Landing and launching swap the {space position, ship} and {land
//! position} component sets atomically -- within one command application no
//! observer can see an entity carrying both.

use orrery_ecs::prelude::Entity;

use crate::command::{contains_ignore_case, movement, Ctx};
use crate::components::{Description, LandPosition, Planet, Ship, SpacePosition};
use crate::engine::Engine;

/// How close a ship must be to a planet to land on it.
const LANDING_RANGE: f64 = 10.0;

pub(crate) fn handle_land(engine: &mut Engine, ctx: &Ctx, planet_name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    if !engine.world.has::<SpacePosition>(actor) {
        ctx.send("You are not in space.");
        return;
    }

    let Some(planet_entity) = find_nearby_planet(engine, actor, planet_name) else {
        ctx.send("You don't see that planet nearby.");
        return;
    };
    let Some(planet) = engine.world.get::<Planet>(planet_entity).cloned() else {
        ctx.send("You don't see that planet nearby.");
        return;
    };

    engine.world.remove::<SpacePosition>(actor);
    engine.world.remove::<Ship>(actor);
    engine
        .world
        .insert(
            actor,
            LandPosition {
                x: 0,
                y: 0,
                zone_id: planet.zone_id,
            },
        )
        .ok();

    ctx.send(&format!("Landing on {}...", planet.name));
    movement::handle_look(engine, ctx);
}

pub(crate) fn handle_launch(engine: &mut Engine, ctx: &Ctx) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    let Some(my) = engine.world.get::<LandPosition>(actor).cloned() else {
        ctx.send("You are not on a planet.");
        return;
    };

    // Recover orbit from the planet whose zone we are standing on; the home
    // sector origin is the fallback if no planet maps back.
    let mut orbit = SpacePosition {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        sector_id: "Alpha".to_string(),
    };
    let planets = engine
        .world
        .query()
        .with::<SpacePosition>()
        .with::<Planet>()
        .entities();
    for planet_entity in planets {
        let matches_zone = engine
            .world
            .get::<Planet>(planet_entity)
            .is_some_and(|p| p.zone_id == my.zone_id);
        if matches_zone {
            if let Some(pos) = engine.world.get::<SpacePosition>(planet_entity) {
                orbit = pos.clone();
            }
            break;
        }
    }

    engine.world.remove::<LandPosition>(actor);
    engine.world.insert(actor, orbit).ok();
    engine
        .world
        .insert(
            actor,
            Ship {
                name: format!("{}'s Ship", ctx.username),
                hull: 100.0,
                max_hull: 100.0,
                shields: 100.0,
                max_shields: 100.0,
            },
        )
        .ok();

    ctx.send("Launching into space...");
    movement::handle_look(engine, ctx);
}

/// Nearest matching planet in the actor's sector within landing range.
fn find_nearby_planet(engine: &Engine, actor: Entity, name: &str) -> Option<Entity> {
    let planets = engine
        .world
        .query()
        .with::<SpacePosition>()
        .with::<Planet>()
        .with::<Description>()
        .entities();

    let mut best: Option<(Entity, f64)> = None;
    for planet in planets {
        let matched = engine
            .world
            .get::<Description>(planet)
            .is_some_and(|desc| contains_ignore_case(&desc.short, name));
        if !matched {
            continue;
        }
        let Some(dist) = engine.distance(actor, planet) else {
            continue;
        };
        if dist < LANDING_RANGE && best.map_or(true, |(_, d)| dist < d) {
            best = Some((planet, dist));
        }
    }
    best.map(|(entity, _)| entity)
}
