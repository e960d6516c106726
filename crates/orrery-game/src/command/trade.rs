//! Shop interaction and the score report.

use orrery_ecs::prelude::Entity;

use crate::command::{find_carried_item, same_land_spot, Ctx};
use crate::components::{
    ContainedBy, Description, Experience, Health, Item, LandPosition, Money, Shopkeeper,
};
use crate::engine::Engine;

/// The one good every shop stocks, at a fixed price.
const POTION_NAME: &str = "Health Potion";
const POTION_COST: i32 = 10;

pub(crate) fn handle_score(engine: &mut Engine, ctx: &Ctx) {
    ctx.send(&format!("Name: {}", ctx.username));
    if let Some(health) = engine.world.get::<Health>(ctx.entity) {
        ctx.send(&format!("Health: {}/{}", health.current, health.max));
    }
    if let Some(xp) = engine.world.get::<Experience>(ctx.entity) {
        ctx.send(&format!("Level: {}", xp.level));
        ctx.send(&format!("XP: {}", xp.value));
    }
    if let Some(money) = engine.world.get::<Money>(ctx.entity) {
        ctx.send(&format!("Money: {} Credits", money.amount));
    }
}

pub(crate) fn handle_buy(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !shopkeeper_here(engine, actor) {
        ctx.send("There is no shop here.");
        return;
    }

    if !name.eq_ignore_ascii_case(POTION_NAME) {
        ctx.send("The shopkeeper doesn't sell that.");
        return;
    }

    let affordable = engine
        .world
        .get::<Money>(actor)
        .is_some_and(|m| m.amount >= POTION_COST);
    if !affordable {
        ctx.send("You cannot afford that.");
        return;
    }
    if let Some(money) = engine.world.get_mut::<Money>(actor) {
        money.amount -= POTION_COST;
    }

    engine.world.spawn((
        Item {
            value: 5,
            weight: 1.0,
        },
        Description {
            short: POTION_NAME.to_string(),
            long: "A small vial of red liquid.".to_string(),
        },
        ContainedBy { holder: actor },
    ));
    ctx.send("You bought a Health Potion.");
}

pub(crate) fn handle_sell(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    if !shopkeeper_here(engine, actor) {
        ctx.send("There is no shop here.");
        return;
    }

    let Some(item) = find_carried_item(engine, actor, name, false, false) else {
        ctx.send("You don't have that.");
        return;
    };
    let value = engine.world.get::<Item>(item).map(|i| i.value).unwrap_or(0);

    engine.world.despawn(item);
    if !engine.world.has::<Money>(actor) {
        engine.world.insert(actor, Money { amount: 0 }).ok();
    }
    if let Some(money) = engine.world.get_mut::<Money>(actor) {
        money.amount += value;
    }
    ctx.send(&format!("You sold {name} for {value} Credits."));
}

/// A shopkeeper at the actor's exact land coordinates.
fn shopkeeper_here(engine: &Engine, actor: Entity) -> bool {
    let Some(my) = engine.world.get::<LandPosition>(actor) else {
        return false;
    };
    engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<Shopkeeper>()
        .entities()
        .into_iter()
        .any(|keeper| {
            engine
                .world
                .get::<LandPosition>(keeper)
                .is_some_and(|pos| same_land_spot(pos, my))
        })
}
