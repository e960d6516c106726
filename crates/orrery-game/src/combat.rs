//! Per-tick combat resolution.
//!
//! The combat state machine has two states per entity: Idle (no
//! [`CombatState`]) and Engaged (component present). Each tick, every
//! Engaged entity whose `next_attack_at` has passed resolves one strike:
//! weapon lookup, target liveness and range gates, damage application,
//! and the death/retaliation follow-ups.
//!
//! The engaged list is materialized before any mutation; every dereference
//! of a captured target handle is preceded by a liveness check, because an
//! earlier strike in the same tick may already have destroyed it.

use orrery_ecs::prelude::{Entity, World};

use crate::components::{
    CombatState, ContainedBy, Container, Corpse, Description, EquipSlot, Equipment, Experience,
    Health, Item, LandPosition, Ship, SpacePosition, Weapon,
};
use crate::engine::Engine;
use crate::quest;

/// The fallback weapon for engaged entities with nothing to swing: low
/// damage, melee range, one-second cooldown. Never attached to an entity.
fn unarmed() -> Weapon {
    Weapon {
        name: "Fists".to_string(),
        damage: 1,
        range: 1,
        cooldown_ms: 1000,
        last_fired_at: None,
    }
}

/// Resolve every Engaged entity once.
pub fn run(engine: &mut Engine, now: u64) {
    let engaged = engine.world.query().with::<CombatState>().entities();
    for attacker in engaged {
        process_attack(engine, attacker, now);
    }
}

fn process_attack(engine: &mut Engine, attacker: Entity, now: u64) {
    if !engine.world.is_alive(attacker) {
        return;
    }
    let Some(state) = engine.world.get::<CombatState>(attacker).copied() else {
        return;
    };
    if now < state.next_attack_at {
        return;
    }

    let (weapon, weapon_entity) = resolve_weapon(engine, attacker);

    if !engine.world.is_alive(state.target) {
        engine.world.remove::<CombatState>(attacker);
        engine.send_to_entity(attacker, "Target is gone.");
        return;
    }

    let in_range = engine
        .distance(attacker, state.target)
        .is_some_and(|d| d <= weapon.range as f64);
    if !in_range {
        engine.world.remove::<CombatState>(attacker);
        engine.send_to_entity(attacker, "Target is out of range. Combat ended.");
        return;
    }

    apply_damage(engine, attacker, state.target, &weapon, now);

    // A kill clears the attacker's state; only a continuing fight pays the
    // cooldown and stamps the weapon.
    if engine.world.has::<CombatState>(attacker) {
        if let Some(state) = engine.world.get_mut::<CombatState>(attacker) {
            state.next_attack_at = now + weapon.cooldown_ms;
        }
        if let Some(weapon_entity) = weapon_entity {
            if let Some(weapon) = engine.world.get_mut::<Weapon>(weapon_entity) {
                weapon.last_fired_at = Some(now);
            }
        }
    }
}

/// Weapon resolution order: the entity's own weapon, else a live main-hand
/// equipped weapon, else the unarmed default.
fn resolve_weapon(engine: &Engine, attacker: Entity) -> (Weapon, Option<Entity>) {
    if let Some(weapon) = engine.world.get::<Weapon>(attacker) {
        return (weapon.clone(), Some(attacker));
    }
    if let Some(equipment) = engine.world.get::<Equipment>(attacker) {
        if let Some(main_hand) = equipment.occupant(EquipSlot::MainHand) {
            if engine.world.is_alive(main_hand) {
                if let Some(weapon) = engine.world.get::<Weapon>(main_hand) {
                    return (weapon.clone(), Some(main_hand));
                }
            }
        }
    }
    (unarmed(), None)
}

fn apply_damage(engine: &mut Engine, attacker: Entity, target: Entity, weapon: &Weapon, now: u64) {
    let attacker_name = engine.display_name(attacker);

    if let Some(ship) = engine.world.get_mut::<Ship>(target) {
        // Shields soak first; only the remainder reaches the hull.
        let mut damage = weapon.damage as f64;
        if ship.shields > 0.0 {
            if ship.shields >= damage {
                ship.shields -= damage;
                damage = 0.0;
            } else {
                damage -= ship.shields;
                ship.shields = 0.0;
            }
        }
        ship.hull -= damage;
        let name = ship.name.clone();
        let shields = ship.shields;
        let hull = ship.hull;

        engine.send_to_entity(attacker, &format!("You fired {} at {}!", weapon.name, name));
        engine.send_to_entity(
            target,
            &format!("{} fired {} at you!", attacker_name, weapon.name),
        );

        if hull <= 0.0 {
            handle_death(engine, target, attacker);
        } else {
            engine.send_to_entity(
                attacker,
                &format!("{name} Status - Shields: {shields}, Hull: {hull}"),
            );
            check_retaliation(engine, attacker, target, now);
        }
    } else if let Some(health) = engine.world.get_mut::<Health>(target) {
        health.current -= weapon.damage;
        let current = health.current;
        let max = health.max;
        let target_name = engine.display_name(target);

        engine.send_to_entity(
            attacker,
            &format!("You hit {} for {} damage!", target_name, weapon.damage),
        );
        engine.send_to_entity(
            target,
            &format!("{} hit you for {} damage!", attacker_name, weapon.damage),
        );

        if current <= 0 {
            handle_death(engine, target, attacker);
        } else {
            engine.send_to_entity(attacker, &format!("{target_name} Health: {current}/{max}"));
            check_retaliation(engine, attacker, target, now);
        }
    }
}

/// The shared death pipeline: XP and leveling for the killer, then respawn
/// for player-controlled victims or quest-credit/corpse/destroy for mobs.
/// Invoked from the per-tick resolver and from damage-dealing casts.
pub(crate) fn handle_death(engine: &mut Engine, victim: Entity, killer: Entity) {
    let victim_name = engine.display_name(victim);
    engine.send_to_entity(killer, &format!("You have defeated {victim_name}!"));
    engine.send_to_entity(victim, "You have died!");

    if engine.world.has::<Experience>(killer) {
        let mut gain = 100;
        if let Some(victim_xp) = engine.world.get::<Experience>(victim) {
            gain += victim_xp.level * 50;
        }
        if let Some(xp) = engine.world.get_mut::<Experience>(killer) {
            xp.value += gain;
        }
        match apply_level_up(&mut engine.world, killer) {
            Some(level) => engine.send_to_entity(
                killer,
                &format!("*** LEVEL UP! You are now level {level}! ***"),
            ),
            None => engine.send_to_entity(killer, &format!("You gain {gain} XP.")),
        }
    }

    if engine.is_player_controlled(victim) {
        engine.send_to_entity(victim, "Respawning at safe location...");
        respawn(&mut engine.world, victim);
    } else {
        quest::on_mob_killed(engine, killer, &victim_name);
        spawn_corpse(&mut engine.world, victim, &victim_name);
        engine.world.despawn(victim);
    }

    engine.world.remove::<CombatState>(killer);
}

/// One level increment per award event: check the threshold once, and on a
/// level-up raise max health by the fixed bonus and restore to full.
/// Returns the new level when it fires.
pub(crate) fn apply_level_up(world: &mut World, entity: Entity) -> Option<i32> {
    let mut new_level = None;
    if let Some(xp) = world.get_mut::<Experience>(entity) {
        if xp.value >= xp.level * 1000 {
            xp.level += 1;
            new_level = Some(xp.level);
        }
    }
    if new_level.is_some() {
        if let Some(health) = world.get_mut::<Health>(entity) {
            health.max += 10;
            health.current = health.max;
        }
    }
    new_level
}

fn respawn(world: &mut World, entity: Entity) {
    if let Some(ship) = world.get_mut::<Ship>(entity) {
        ship.hull = ship.max_hull;
        ship.shields = ship.max_shields;
    }
    if let Some(health) = world.get_mut::<Health>(entity) {
        health.current = health.max;
    }
    if let Some(pos) = world.get_mut::<SpacePosition>(entity) {
        pos.x = 0.0;
        pos.y = 0.0;
        pos.z = 0.0;
        pos.sector_id = "Alpha".to_string();
    }
    if let Some(pos) = world.get_mut::<LandPosition>(entity) {
        pos.x = 0;
        pos.y = 0;
    }
    world.remove::<CombatState>(entity);
}

/// Leave a lootable corpse at the victim's last position.
fn spawn_corpse(world: &mut World, victim: Entity, victim_name: &str) {
    let corpse = world.spawn((
        Description {
            short: format!("Corpse of {victim_name}"),
            long: format!("The dead body of {victim_name} lies here."),
        },
        Container { capacity: 10 },
        Corpse,
    ));

    if let Some(pos) = world.get::<SpacePosition>(victim).cloned() {
        world.insert(corpse, pos).ok();
    }
    if let Some(pos) = world.get::<LandPosition>(victim).cloned() {
        world.insert(corpse, pos).ok();
    }

    world.spawn((
        Description {
            short: "Credits".to_string(),
            long: "A small pile of credits.".to_string(),
        },
        Item {
            value: 100,
            weight: 0.0,
        },
        ContainedBy { holder: corpse },
    ));
}

/// A surviving, unengaged, armed target turns to fight its attacker.
fn check_retaliation(engine: &mut Engine, attacker: Entity, target: Entity, now: u64) {
    if engine.world.has::<CombatState>(target) {
        return;
    }
    if !engine.world.has::<Weapon>(target) {
        return;
    }

    engine
        .world
        .insert(
            target,
            CombatState {
                target: attacker,
                next_attack_at: now,
            },
        )
        .ok();

    let attacker_name = engine.display_name(attacker);
    let target_name = engine.display_name(target);
    engine.send_to_entity(
        target,
        &format!("You are under attack by {attacker_name}! Engaging!"),
    );
    engine.send_to_entity(attacker, &format!("{target_name} turns to fight you!"));
}
