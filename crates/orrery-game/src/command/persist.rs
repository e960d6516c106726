//! Persistence sync: snapshot the acting target into its account.
//!
//! The stored health/xp/money/position/location-kind fields are
//! overwritten from the live entity, and the owned-items collection is
//! reconciled against the persisted rows: rows with a known durable id are
//! updated, items without one become new rows (the store assigns ids,
//! which are stamped back onto the entities), and rows for items no longer
//! carried are dropped. The actual write is the store's problem.

use anyhow::Context as _;
use orrery_ecs::prelude::Entity;

use crate::account::AccountItem;
use crate::components::{
    ContainedBy, DbId, Description, Experience, Health, Item, LandPosition, Money, SpacePosition,
};
use crate::engine::Engine;
use crate::session::SessionView;

pub fn save_session(engine: &mut Engine, view: &SessionView) -> anyhow::Result<()> {
    let Some(player_entity) = view.entity else {
        return Ok(());
    };
    let target = engine.acting_entity(player_entity);
    if !engine.world.is_alive(target) {
        return Ok(());
    }
    let Some(username) = view.username.as_deref() else {
        return Ok(());
    };

    let mut account = engine
        .accounts
        .load_by_name(username)?
        .with_context(|| format!("no stored account for {username}"))?;

    if let Some(health) = engine.world.get::<Health>(target) {
        account.current_health = health.current;
        account.max_health = health.max;
    }
    if let Some(xp) = engine.world.get::<Experience>(target) {
        account.experience = xp.value;
        account.level = xp.level;
    }
    if let Some(money) = engine.world.get::<Money>(target) {
        account.money = money.amount;
    }
    if let Some(pos) = engine.world.get::<SpacePosition>(target) {
        account.x = pos.x as i32;
        account.y = pos.y as i32;
        account.z = pos.z as i32;
        account.location_id = pos.sector_id.clone();
        account.in_space = true;
    } else if let Some(pos) = engine.world.get::<LandPosition>(target) {
        account.x = pos.x;
        account.y = pos.y;
        account.z = 0;
        account.location_id = pos.zone_id.clone();
        account.in_space = false;
    }

    // Materialize the currently-carried set and rebuild the rows from it.
    // Replacing the collection wholesale is the diff: known ids update,
    // id-less rows insert, absent ids delete.
    let carried = engine
        .world
        .query()
        .with::<Item>()
        .with::<ContainedBy>()
        .with::<Description>()
        .entities();

    let mut rows = Vec::new();
    let mut unsaved: Vec<(usize, Entity)> = Vec::new();
    for entity in carried {
        if engine.world.get::<ContainedBy>(entity).map(|c| c.holder) != Some(target) {
            continue;
        }
        let (Some(item), Some(desc)) = (
            engine.world.get::<Item>(entity),
            engine.world.get::<Description>(entity),
        ) else {
            continue;
        };
        let id = engine.world.get::<DbId>(entity).map(|d| d.0).unwrap_or(0);
        if id == 0 {
            unsaved.push((rows.len(), entity));
        }
        rows.push(AccountItem {
            id,
            name: desc.short.clone(),
            value: item.value,
            weight: item.weight,
        });
    }
    account.items = rows;

    let saved = engine.accounts.save(account)?;

    // Stamp the freshly assigned durable ids back onto the new items.
    for (row, entity) in unsaved {
        if let Some(item) = saved.items.get(row) {
            engine.world.insert(entity, DbId(item.id)).ok();
        }
    }

    Ok(())
}
