//! Inventory, ground pickup, looting, and equipment.

use orrery_ecs::prelude::Entity;

use crate::command::{contains_ignore_case, find_carried_item, same_land_spot, Ctx};
use crate::components::{
    ContainedBy, Container, Description, Equipment, Equippable, Equipped, Item, LandPosition,
    SpacePosition,
};
use crate::engine::Engine;

/// Items the looter can reach a container from.
const LOOT_REACH: f64 = 5.0;

pub(crate) fn handle_get(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    let Some(my) = engine.world.get::<LandPosition>(actor).cloned() else {
        ctx.send("You can't pick things up here.");
        return;
    };

    let ground = engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<Item>()
        .with::<Description>()
        .entities();
    let mut target = None;
    for candidate in ground {
        let here = engine
            .world
            .get::<LandPosition>(candidate)
            .is_some_and(|pos| same_land_spot(pos, &my));
        if !here {
            continue;
        }
        let matched = engine
            .world
            .get::<Description>(candidate)
            .is_some_and(|desc| contains_ignore_case(&desc.short, name));
        if matched {
            target = Some(candidate);
            break;
        }
    }

    let Some(target) = target else {
        ctx.send("You don't see that here.");
        return;
    };

    let short = engine
        .world
        .get::<Description>(target)
        .map(|d| d.short.clone())
        .unwrap_or_else(|| "something".to_string());
    engine.world.remove::<LandPosition>(target);
    engine
        .world
        .insert(target, ContainedBy { holder: actor })
        .ok();
    ctx.send(&format!("You pick up {short}."));
}

pub(crate) fn handle_loot(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }

    let Some(target) = find_nearby_described(engine, actor, name, LOOT_REACH) else {
        ctx.send("You don't see that here.");
        return;
    };
    if !engine.world.has::<Container>(target) {
        ctx.send("That is not a container.");
        return;
    }

    let contents: Vec<Entity> = engine
        .world
        .query()
        .with::<Item>()
        .with::<ContainedBy>()
        .entities()
        .into_iter()
        .filter(|&item| {
            engine.world.get::<ContainedBy>(item).map(|c| c.holder) == Some(target)
        })
        .collect();

    let mut found_any = false;
    for item in contents {
        let short = engine
            .world
            .get::<Description>(item)
            .map(|d| d.short.clone())
            .unwrap_or_else(|| "something".to_string());
        let value = engine.world.get::<Item>(item).map(|i| i.value).unwrap_or(0);
        if let Some(contained) = engine.world.get_mut::<ContainedBy>(item) {
            contained.holder = actor;
        }
        ctx.send(&format!("You loot {short} (Value: {value})."));
        found_any = true;
    }

    if !found_any {
        ctx.send("It is empty.");
    }
}

pub(crate) fn handle_drop(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    let Some(item) = find_carried_item(engine, actor, name, false, false) else {
        ctx.send("You don't have that.");
        return;
    };

    engine.world.remove::<ContainedBy>(item);
    // Dropped items land exactly where the actor stands.
    if let Some(pos) = engine.world.get::<SpacePosition>(actor).cloned() {
        engine.world.insert(item, pos).ok();
    } else if let Some(pos) = engine.world.get::<LandPosition>(actor).cloned() {
        engine.world.insert(item, pos).ok();
    }
    ctx.send(&format!("You drop {name}."));
}

pub(crate) fn handle_inventory(engine: &mut Engine, ctx: &Ctx) {
    let actor = engine.acting_entity(ctx.entity);
    let carried = engine
        .world
        .query()
        .with::<Item>()
        .with::<ContainedBy>()
        .with::<Description>()
        .entities();

    let mut lines = Vec::new();
    for item in carried {
        if engine.world.get::<ContainedBy>(item).map(|c| c.holder) != Some(actor) {
            continue;
        }
        if engine.world.has::<Equipped>(item) {
            continue;
        }
        let (Some(desc), Some(item_stats)) = (
            engine.world.get::<Description>(item),
            engine.world.get::<Item>(item),
        ) else {
            continue;
        };
        lines.push(format!("{} (Value: {})", desc.short, item_stats.value));
    }

    if lines.is_empty() {
        ctx.send("You are not carrying anything.");
    } else {
        ctx.send("You are carrying:");
        for line in lines {
            ctx.send(&format!("- {line}"));
        }
    }
}

pub(crate) fn handle_equip(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(actor) {
        return;
    }
    let Some(item) = find_carried_item(engine, actor, name, true, true) else {
        ctx.send("You don't have that.");
        return;
    };
    let Some(slot) = engine.world.get::<Equippable>(item).map(|e| e.slot) else {
        ctx.send("You don't have that.");
        return;
    };

    if !engine.world.has::<Equipment>(actor) {
        engine.world.insert(actor, Equipment::default()).ok();
    }
    let displaced = engine
        .world
        .get_mut::<Equipment>(actor)
        .and_then(|equipment| equipment.set(slot, item));

    // One item per slot: the previous occupant comes off automatically.
    if let Some(old) = displaced {
        if engine.world.is_alive(old) {
            engine.world.remove::<Equipped>(old);
            let old_name = engine
                .world
                .get::<Description>(old)
                .map(|d| d.short.clone())
                .unwrap_or_else(|| "something".to_string());
            ctx.send(&format!("You remove {old_name}."));
        }
    }

    engine
        .world
        .insert(item, Equipped { wearer: actor, slot })
        .ok();
    let short = engine
        .world
        .get::<Description>(item)
        .map(|d| d.short.clone())
        .unwrap_or_else(|| "it".to_string());
    ctx.send(&format!("You equip {short}."));
}

pub(crate) fn handle_unequip(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    let Some(equipment) = engine.world.get::<Equipment>(actor).cloned() else {
        ctx.send("You are not wearing anything.");
        return;
    };

    let mut found = None;
    for (slot, item) in equipment.iter() {
        if !engine.world.is_alive(item) {
            continue;
        }
        let Some(desc) = engine.world.get::<Description>(item) else {
            continue;
        };
        if contains_ignore_case(&desc.short, name) {
            found = Some((slot, item, desc.short.clone()));
            break;
        }
    }

    let Some((slot, item, item_name)) = found else {
        ctx.send("You are not wearing that.");
        return;
    };

    if let Some(equipment) = engine.world.get_mut::<Equipment>(actor) {
        equipment.clear(slot);
    }
    engine.world.remove::<Equipped>(item);
    ctx.send(&format!("You unequip {item_name}."));
}

/// Nearest described entity within `reach` of the actor, matched by short
/// description substring.
fn find_nearby_described(
    engine: &Engine,
    actor: Entity,
    name: &str,
    reach: f64,
) -> Option<Entity> {
    let candidates = if engine.world.has::<SpacePosition>(actor) {
        engine
            .world
            .query()
            .with::<SpacePosition>()
            .with::<Description>()
            .entities()
    } else if engine.world.has::<LandPosition>(actor) {
        engine
            .world
            .query()
            .with::<LandPosition>()
            .with::<Description>()
            .entities()
    } else {
        return None;
    };

    let mut best: Option<(Entity, f64)> = None;
    for candidate in candidates {
        if candidate == actor {
            continue;
        }
        let matched = engine
            .world
            .get::<Description>(candidate)
            .is_some_and(|desc| contains_ignore_case(&desc.short, name));
        if !matched {
            continue;
        }
        let Some(dist) = engine.distance(actor, candidate) else {
            continue;
        };
        if dist < reach && best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(entity, _)| entity)
}
