//! The quest log: list, accept, turn in.

use orrery_ecs::prelude::Entity;

use crate::catalog::QuestDef;
use crate::combat;
use crate::command::{contains_ignore_case, same_land_spot, Ctx};
use crate::components::{
    Experience, LandPosition, Money, QuestGiver, QuestLog, QuestState, QuestStatus,
};
use crate::engine::Engine;

pub(crate) fn handle(engine: &mut Engine, ctx: &Ctx, parts: &[&str]) {
    if parts.len() > 1 {
        let sub = parts[1].to_ascii_lowercase();
        match sub.as_str() {
            "list" => handle_list(engine, ctx),
            "accept" if parts.len() > 2 => handle_accept(engine, ctx, &parts[2..].join(" ")),
            "complete" if parts.len() > 2 => handle_complete(engine, ctx, &parts[2..].join(" ")),
            _ => ctx.send(
                "Usage: quest list, quest accept <quest name>, quest complete <quest name>",
            ),
        }
    } else {
        handle_list(engine, ctx);
    }
}

fn handle_list(engine: &Engine, ctx: &Ctx) {
    let Some(log) = engine.world.get::<QuestLog>(ctx.entity) else {
        ctx.send("You have no active quests.");
        return;
    };
    if log.quests.is_empty() {
        ctx.send("You have no active quests.");
        return;
    }

    ctx.send("--- Quest Log ---");
    for quest in &log.quests {
        match engine.catalog.quest(&quest.quest_id) {
            Some(def) => {
                let progress = if quest.status == QuestStatus::InProgress {
                    format!(" ({}/{})", quest.progress, def.target_count)
                } else {
                    String::new()
                };
                ctx.send(&format!("{}: {}{}", def.title, quest.status, progress));
            }
            None => ctx.send(&format!(
                "Unknown Quest ({}): {}",
                quest.quest_id, quest.status
            )),
        }
    }
}

fn handle_accept(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);
    let Some(my) = engine.world.get::<LandPosition>(actor).cloned() else {
        ctx.send("You can't accept quests here.");
        return;
    };

    // First giver at this spot offering a title match.
    let mut found: Option<QuestDef> = None;
    'givers: for giver in giver_entities(engine) {
        let here = engine
            .world
            .get::<LandPosition>(giver)
            .is_some_and(|pos| same_land_spot(pos, &my));
        if !here {
            continue;
        }
        let Some(offered) = engine.world.get::<QuestGiver>(giver) else {
            continue;
        };
        for quest_id in &offered.quest_ids {
            if let Some(def) = engine.catalog.quest(quest_id) {
                if contains_ignore_case(&def.title, name) {
                    found = Some(def.clone());
                    break 'givers;
                }
            }
        }
    }

    let Some(def) = found else {
        ctx.send("No one here has that quest for you.");
        return;
    };

    if !engine.world.has::<QuestLog>(ctx.entity) {
        engine.world.insert(ctx.entity, QuestLog::default()).ok();
    }
    let Some(log) = engine.world.get_mut::<QuestLog>(ctx.entity) else {
        return;
    };
    if log.quests.iter().any(|q| q.quest_id == def.id) {
        ctx.send("You already have that quest.");
        return;
    }
    log.quests.push(QuestState {
        quest_id: def.id.clone(),
        status: QuestStatus::InProgress,
        progress: 0,
    });

    ctx.send(&format!("Quest Accepted: {}", def.title));
    ctx.send(&def.description);
}

fn handle_complete(engine: &mut Engine, ctx: &Ctx, name: &str) {
    let actor = engine.acting_entity(ctx.entity);

    // Find the quest in the log by title.
    let mut target: Option<(usize, QuestDef, QuestStatus)> = None;
    if let Some(log) = engine.world.get::<QuestLog>(ctx.entity) {
        for (index, quest) in log.quests.iter().enumerate() {
            if let Some(def) = engine.catalog.quest(&quest.quest_id) {
                if contains_ignore_case(&def.title, name) {
                    target = Some((index, def.clone(), quest.status));
                    break;
                }
            }
        }
    } else {
        ctx.send("You have no active quests.");
        return;
    }

    let Some((index, def, status)) = target else {
        ctx.send("You don't have that quest.");
        return;
    };

    if status != QuestStatus::Completed {
        if status == QuestStatus::TurnedIn {
            ctx.send("You have already completed that quest.");
        } else {
            ctx.send("You haven't completed the objectives yet.");
        }
        return;
    }

    // The giver must be standing here to take the turn-in.
    let Some(my) = engine.world.get::<LandPosition>(actor).cloned() else {
        ctx.send("You can't turn in quests here.");
        return;
    };
    let giver_present = giver_entities(engine).into_iter().any(|giver| {
        let here = engine
            .world
            .get::<LandPosition>(giver)
            .is_some_and(|pos| same_land_spot(pos, &my));
        here && engine
            .world
            .get::<QuestGiver>(giver)
            .is_some_and(|g| g.quest_ids.contains(&def.id))
    });
    if !giver_present {
        ctx.send("The quest giver is not here.");
        return;
    }

    if let Some(log) = engine.world.get_mut::<QuestLog>(ctx.entity) {
        if let Some(quest) = log.quests.get_mut(index) {
            quest.status = QuestStatus::TurnedIn;
        }
    }

    // Rewards go to the player entity, with the shared leveling check.
    if def.reward_xp > 0 && engine.world.has::<Experience>(ctx.entity) {
        if let Some(xp) = engine.world.get_mut::<Experience>(ctx.entity) {
            xp.value += def.reward_xp;
        }
        if let Some(level) = combat::apply_level_up(&mut engine.world, ctx.entity) {
            ctx.send(&format!("*** LEVEL UP! You are now level {level}! ***"));
        }
        ctx.send(&format!("You gained {} XP.", def.reward_xp));
    }

    if def.reward_gold > 0 {
        if !engine.world.has::<Money>(ctx.entity) {
            engine.world.insert(ctx.entity, Money { amount: 0 }).ok();
        }
        if let Some(money) = engine.world.get_mut::<Money>(ctx.entity) {
            money.amount += def.reward_gold;
        }
        ctx.send(&format!("You gained {} credits.", def.reward_gold));
    }

    ctx.send(&format!("Quest Completed: {}", def.title));
}

fn giver_entities(engine: &Engine) -> Vec<Entity> {
    engine
        .world
        .query()
        .with::<LandPosition>()
        .with::<QuestGiver>()
        .entities()
}
