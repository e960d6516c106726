//! Hostile-mob target acquisition.
//!
//! Each tick, every aggressive, weapon-bearing, *unengaged* entity scans for
//! the nearest player-controlled candidate within its weapon range -- ships
//! in the same sector for space mobs, player avatars in the same zone for
//! land mobs -- and opens combat on a hit. Ties on exact distance go to the
//! first candidate found (ascending slot order).

use orrery_ecs::prelude::Entity;

use crate::components::{
    Aggressive, CombatState, LandPosition, Player, Ship, SpacePosition, Weapon,
};
use crate::engine::Engine;

pub fn run(engine: &mut Engine, now: u64) {
    let mobs = engine
        .world
        .query()
        .with::<Aggressive>()
        .with::<Weapon>()
        .without::<CombatState>()
        .entities();
    for mob in mobs {
        scan_for_target(engine, mob, now);
    }
}

fn scan_for_target(engine: &mut Engine, mob: Entity, now: u64) {
    if !engine.world.is_alive(mob) {
        return;
    }
    let Some(range) = engine.world.get::<Weapon>(mob).map(|w| w.range as f64) else {
        return;
    };

    let target = if engine.world.has::<SpacePosition>(mob) {
        find_space_target(engine, mob, range)
    } else if engine.world.has::<LandPosition>(mob) {
        find_land_target(engine, mob, range)
    } else {
        None
    };

    let Some(target) = target else {
        return;
    };

    engine
        .world
        .insert(
            mob,
            CombatState {
                target,
                next_attack_at: now,
            },
        )
        .ok();

    let mob_name = engine.display_name(mob);
    engine.send_to_entity(target, &format!("{mob_name} screams and attacks you!"));
}

/// Nearest player-controlled ship in the mob's sector within `range`.
fn find_space_target(engine: &Engine, mob: Entity, range: f64) -> Option<Entity> {
    let candidates = engine
        .world
        .query()
        .with::<SpacePosition>()
        .with::<Ship>()
        .entities();

    let mut best: Option<(Entity, f64)> = None;
    for candidate in candidates {
        if candidate == mob || !engine.is_player_controlled(candidate) {
            continue;
        }
        let Some(dist) = engine.distance(mob, candidate) else {
            continue;
        };
        if dist <= range && best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(entity, _)| entity)
}

/// Nearest player avatar in the mob's zone within `range`.
fn find_land_target(engine: &Engine, mob: Entity, range: f64) -> Option<Entity> {
    let candidates = engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<Player>()
        .entities();

    let mut best: Option<(Entity, f64)> = None;
    for candidate in candidates {
        if candidate == mob {
            continue;
        }
        let Some(dist) = engine.distance(mob, candidate) else {
            continue;
        };
        if dist <= range && best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(entity, _)| entity)
}
