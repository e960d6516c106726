//! Engaging and disengaging targets.

use orrery_ecs::prelude::Entity;

use crate::command::{contains_ignore_case, Ctx};
use crate::components::{
    CombatState, Description, Health, LandPosition, Player, Ship, SpacePosition, Weapon,
};
use crate::engine::Engine;

/// `attack <name>`: substring-match a target among same-sector ships or
/// same-zone health-bearing entities, nearest first, then open (or retarget)
/// combat with an immediate first strike.
pub(crate) fn handle_attack(engine: &mut Engine, ctx: &Ctx, target_name: &str, now: u64) {
    let attacker = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(attacker) {
        return;
    }

    let Some(weapon) = engine.world.get::<Weapon>(attacker).cloned() else {
        ctx.send("You have no weapons!");
        return;
    };
    if !weapon.is_ready(now) {
        ctx.send("Weapons are recharging...");
        return;
    }

    let found = if engine.world.has::<SpacePosition>(attacker) {
        find_space_target(engine, attacker, target_name)
    } else if engine.world.has::<LandPosition>(attacker) {
        find_land_target(engine, attacker, target_name)
    } else {
        None
    };

    let Some((target, distance)) = found else {
        ctx.send("Target not found.");
        return;
    };
    if distance > weapon.range as f64 {
        ctx.send("Target is out of range.");
        return;
    }

    let retargeting = engine.world.has::<CombatState>(attacker);
    engine
        .world
        .insert(
            attacker,
            CombatState {
                target,
                next_attack_at: now,
            },
        )
        .ok();
    if retargeting {
        ctx.send(&format!("Switched target to {target_name}."));
    } else {
        ctx.send(&format!("Attacking {target_name}!"));
    }
}

pub(crate) fn handle_stop(engine: &mut Engine, ctx: &Ctx) {
    let attacker = engine.acting_entity(ctx.entity);
    if engine.world.remove::<CombatState>(attacker).is_some() {
        ctx.send("You stop attacking.");
    } else {
        ctx.send("You are not attacking anyone.");
    }
}

/// Nearest same-sector ship whose name matches.
fn find_space_target(engine: &Engine, attacker: Entity, name: &str) -> Option<(Entity, f64)> {
    let candidates = engine
        .world
        .query()
        .with::<SpacePosition>()
        .with::<Ship>()
        .entities();

    let mut best: Option<(Entity, f64)> = None;
    for candidate in candidates {
        if candidate == attacker {
            continue;
        }
        let matched = engine
            .world
            .get::<Ship>(candidate)
            .is_some_and(|ship| contains_ignore_case(&ship.name, name));
        if !matched {
            continue;
        }
        let Some(dist) = engine.distance(attacker, candidate) else {
            continue;
        };
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best
}

/// Nearest same-zone health-bearing entity whose name matches. Name order
/// follows the display rule: short description, else player name.
fn find_land_target(engine: &Engine, attacker: Entity, name: &str) -> Option<(Entity, f64)> {
    let candidates = engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<Health>()
        .entities();

    let mut best: Option<(Entity, f64)> = None;
    for candidate in candidates {
        if candidate == attacker {
            continue;
        }
        let candidate_name = if let Some(desc) = engine.world.get::<Description>(candidate) {
            desc.short.clone()
        } else if let Some(player) = engine.world.get::<Player>(candidate) {
            player.name.clone()
        } else {
            "Unknown".to_string()
        };
        if !contains_ignore_case(&candidate_name, name) {
            continue;
        }
        let Some(dist) = engine.distance(attacker, candidate) else {
            continue;
        };
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best
}
