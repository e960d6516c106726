//! Kill-event quest progression.
//!
//! The Combat System reports each mob kill here by victim display name.
//! Credit goes to the player behind the killer: if some session's player is
//! controlling the killing entity, that player's quest log advances,
//! otherwise the killer's own. Every matching in-progress kill quest gains
//! one point of progress; hitting the target count flips it to Completed,
//! ready to turn in at the quest giver.
//!
//! Notifications are collected during the log walk and dispatched after it.

use orrery_ecs::prelude::Entity;

use crate::catalog::QuestType;
use crate::components::{Controlling, QuestLog, QuestStatus};
use crate::engine::Engine;

pub fn on_mob_killed(engine: &mut Engine, killer: Entity, victim_name: &str) {
    if !engine.world.is_alive(killer) {
        return;
    }

    // Resolve the credited player. A kill made through a piloted vehicle
    // credits the pilot; the reverse lookup is a linear session scan,
    // first match wins (see DESIGN.md).
    let mut credited = killer;
    for view in engine.sessions.views() {
        let Some(player_entity) = view.entity else {
            continue;
        };
        let controls_killer = engine
            .world
            .get::<Controlling>(player_entity)
            .is_some_and(|c| c.target == killer);
        if controls_killer {
            credited = player_entity;
            break;
        }
    }

    let mut notes = Vec::new();
    {
        let Engine {
            ref mut world,
            ref catalog,
            ..
        } = *engine;
        if let Some(log) = world.get_mut::<QuestLog>(credited) {
            for quest in log.quests.iter_mut() {
                if quest.status != QuestStatus::InProgress {
                    continue;
                }
                let Some(def) = catalog.quest(&quest.quest_id) else {
                    continue;
                };
                if def.quest_type != QuestType::Kill
                    || !def.target_name.eq_ignore_ascii_case(victim_name)
                {
                    continue;
                }

                quest.progress += 1;
                if quest.progress >= def.target_count {
                    quest.status = QuestStatus::Completed;
                    notes.push(format!("Quest Complete: {}!", def.title));
                } else {
                    notes.push(format!(
                        "Quest Update: {} ({}/{})",
                        def.title, quest.progress, def.target_count
                    ));
                }
            }
        }
    }

    if !notes.is_empty() {
        if let Some(view) = engine.sessions.find_by_entity(credited) {
            for note in &notes {
                view.conn.send(note);
            }
        }
    }
}
