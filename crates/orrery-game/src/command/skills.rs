//! Spellcasting.
//!
//! `cast <skill> [target]` matches a known skill by name-prefix so
//! multi-word skill names work without quoting; whatever follows the name is
//! the target. Mana and the per-skill cooldown gate the cast. Heals affect
//! the caster; damage casts hit an explicit or combat-implied target and a
//! kill runs the shared death pipeline in the same tick (see DESIGN.md).

use orrery_ecs::prelude::Entity;

use crate::catalog::{SkillDef, SkillType};
use crate::combat;
use crate::command::{contains_ignore_case, same_land_spot, Ctx};
use crate::components::{
    CombatState, Description, Health, KnownSkills, LandPosition, Mana, SkillCooldowns,
};
use crate::engine::Engine;

pub(crate) fn handle_cast(engine: &mut Engine, ctx: &Ctx, args: &str, now: u64) {
    let caster = engine.acting_entity(ctx.entity);
    if !engine.world.is_alive(caster) {
        return;
    }

    let Some(known) = engine.world.get::<KnownSkills>(caster) else {
        ctx.send("You don't know any skills.");
        return;
    };

    // Match a known skill whose name prefixes the argument string.
    let mut chosen: Option<(SkillDef, String)> = None;
    for skill_id in &known.skill_ids {
        let Some(def) = engine.catalog.skill(skill_id) else {
            continue;
        };
        let Some(prefix) = args.get(..def.name.len()) else {
            continue;
        };
        if prefix.eq_ignore_ascii_case(&def.name) {
            let target_name = args[def.name.len()..].trim().to_string();
            chosen = Some((def.clone(), target_name));
            break;
        }
    }

    let Some((skill, target_name)) = chosen else {
        ctx.send("You don't know that skill.");
        return;
    };

    if let Some(mana) = engine.world.get::<Mana>(caster) {
        if mana.current < skill.mana_cost {
            ctx.send("Not enough mana.");
            return;
        }
    }

    if let Some(cooldowns) = engine.world.get::<SkillCooldowns>(caster) {
        if let Some(&ready_at) = cooldowns.ready_at.get(&skill.id) {
            if now < ready_at {
                let remaining = (ready_at - now) as f64 / 1000.0;
                ctx.send(&format!(
                    "{} is on cooldown ({remaining:.1}s).",
                    skill.name
                ));
                return;
            }
        }
    }

    match skill.skill_type {
        SkillType::Heal => {
            if let Some(health) = engine.world.get_mut::<Health>(caster) {
                health.current = health.max.min(health.current + skill.value);
                ctx.send(&format!(
                    "You cast {} and heal for {}.",
                    skill.name, skill.value
                ));
            }
        }
        SkillType::Damage => {
            let target = if target_name.is_empty() {
                // No explicit target: fall back to the current fight.
                match engine.world.get::<CombatState>(caster) {
                    Some(state) => state.target,
                    None => {
                        ctx.send("Cast at whom?");
                        return;
                    }
                }
            } else {
                match find_target(engine, caster, &target_name) {
                    Some(target) => target,
                    None => {
                        ctx.send("You don't see them here.");
                        return;
                    }
                }
            };
            cast_damage(engine, ctx, caster, target, &skill, now);
        }
        SkillType::Buff => {}
    }

    // The cast happened (even if the target turned out to be gone): pay the
    // mana and start the cooldown.
    if let Some(mana) = engine.world.get_mut::<Mana>(caster) {
        mana.current -= skill.mana_cost;
    }
    if !engine.world.has::<SkillCooldowns>(caster) {
        engine
            .world
            .insert(caster, SkillCooldowns::default())
            .ok();
    }
    if let Some(cooldowns) = engine.world.get_mut::<SkillCooldowns>(caster) {
        cooldowns
            .ready_at
            .insert(skill.id.clone(), now + skill.cooldown_ms);
    }
}

fn cast_damage(
    engine: &mut Engine,
    ctx: &Ctx,
    caster: Entity,
    target: Entity,
    skill: &SkillDef,
    now: u64,
) {
    // The handle may predate this tick; check before touching it.
    if !engine.world.is_alive(target) {
        ctx.send("Target is dead or gone.");
        return;
    }

    let target_name = engine.display_name(target);
    let Some(health) = engine.world.get_mut::<Health>(target) else {
        ctx.send("Nothing happens.");
        return;
    };
    health.current -= skill.value;
    let current = health.current;

    ctx.send(&format!(
        "You cast {} on {} for {} damage!",
        skill.name, target_name, skill.value
    ));

    if current <= 0 {
        // A killing cast runs the full death pipeline now, not on the next
        // combat tick.
        combat::handle_death(engine, target, caster);
    } else if !engine.world.has::<CombatState>(caster) {
        // The fight is on; the first regular strike lands a second out.
        engine
            .world
            .insert(
                caster,
                CombatState {
                    target,
                    next_attack_at: now + 1000,
                },
            )
            .ok();
    }
}

/// Explicit cast targets are found at the caster's exact land coordinates.
fn find_target(engine: &Engine, caster: Entity, name: &str) -> Option<Entity> {
    let my = engine.world.get::<LandPosition>(caster)?;
    engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<Description>()
        .entities()
        .into_iter()
        .find(|&candidate| {
            candidate != caster
                && engine
                    .world
                    .get::<LandPosition>(candidate)
                    .is_some_and(|pos| same_land_spot(pos, my))
                && engine
                    .world
                    .get::<Description>(candidate)
                    .is_some_and(|desc| contains_ignore_case(&desc.short, name))
        })
}
