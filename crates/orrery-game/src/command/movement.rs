//! Looking and moving.

use orrery_ecs::prelude::Entity;

use crate::command::{same_land_spot, Ctx};
use crate::components::{CombatState, Description, LandPosition, SpacePosition};
use crate::engine::Engine;

pub(crate) fn handle_look(engine: &mut Engine, ctx: &Ctx) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }

    if let Some(my) = engine.world.get::<SpacePosition>(actor).cloned() {
        ctx.send(&format!(
            "You are at Sector {} ({}, {}, {})",
            my.sector_id, my.x, my.y, my.z
        ));
        let others = engine
            .world
            .query()
            .with::<SpacePosition>()
            .with::<Description>()
            .entities();
        for other in others {
            if other == actor {
                continue;
            }
            let here = engine.world.get::<SpacePosition>(other).is_some_and(|pos| {
                pos.sector_id == my.sector_id && pos.x == my.x && pos.y == my.y && pos.z == my.z
            });
            if here {
                if let Some(desc) = engine.world.get::<Description>(other) {
                    ctx.send(&desc.long);
                }
            }
        }
    } else if let Some(my) = engine.world.get::<LandPosition>(actor).cloned() {
        ctx.send(&format!(
            "You are at Zone {} ({}, {})",
            my.zone_id, my.x, my.y
        ));
        let others = engine
            .world
            .query()
            .with::<LandPosition>()
            .with::<Description>()
            .entities();
        for other in others {
            if other == actor {
                continue;
            }
            let here = engine
                .world
                .get::<LandPosition>(other)
                .is_some_and(|pos| same_land_spot(pos, &my));
            if here {
                if let Some(desc) = engine.world.get::<Description>(other) {
                    ctx.send(&desc.long);
                }
            }
        }
    } else {
        ctx.send("You are nowhere.");
    }
}

pub(crate) fn handle_move(engine: &mut Engine, ctx: &Ctx, direction: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    let direction = direction.to_ascii_lowercase();

    if engine.world.has::<SpacePosition>(actor) {
        let (dx, dy, dz) = match direction.as_str() {
            "n" => (0.0, 1.0, 0.0),
            "s" => (0.0, -1.0, 0.0),
            "e" => (1.0, 0.0, 0.0),
            "w" => (-1.0, 0.0, 0.0),
            "u" => (0.0, 0.0, 1.0),
            "d" => (0.0, 0.0, -1.0),
            _ => {
                ctx.send("Invalid direction. Use n, s, e, w, u, d.");
                return;
            }
        };
        break_off_combat(engine, ctx, actor);
        if let Some(pos) = engine.world.get_mut::<SpacePosition>(actor) {
            pos.x += dx;
            pos.y += dy;
            pos.z += dz;
            let (x, y, z) = (pos.x, pos.y, pos.z);
            ctx.send(&format!("Moved {direction}. Position: {x:.1}, {y:.1}, {z:.1}"));
        }
    } else if engine.world.has::<LandPosition>(actor) {
        let (dx, dy) = match direction.as_str() {
            "n" => (0, 1),
            "s" => (0, -1),
            "e" => (1, 0),
            "w" => (-1, 0),
            _ => {
                ctx.send("Invalid direction. Use n, s, e, w.");
                return;
            }
        };
        break_off_combat(engine, ctx, actor);
        if let Some(pos) = engine.world.get_mut::<LandPosition>(actor) {
            pos.x += dx;
            pos.y += dy;
            let (x, y) = (pos.x as f64, pos.y as f64);
            ctx.send(&format!("Moved {direction}. Position: {x:.1}, {y:.1}"));
        }
    } else {
        ctx.send("You cannot move.");
    }
}

/// Moving always disengages; a rejected direction never reaches this.
fn break_off_combat(engine: &mut Engine, ctx: &Ctx, actor: Entity) {
    if engine.world.remove::<CombatState>(actor).is_some() {
        ctx.send("You break off the attack.");
    }
}
