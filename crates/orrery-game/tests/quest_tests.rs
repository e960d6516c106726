//! Quest lifecycle: accept, kill-credit progression, turn-in rewards.

mod common;

use common::{spawn_land_mob, TestWorld};
use orrery_game::content::{self, WorldConfig};
use orrery_game::prelude::*;
use orrery_game::quest;

/// A world with the rat-cull quest in the catalog and an elder offering it
/// at the Earth origin.
fn quest_world() -> TestWorld {
    let mut world = TestWorld::new();
    let config = WorldConfig {
        quests: vec![QuestDef {
            id: "quest_rat_cull".to_string(),
            title: "Rat Extermination".to_string(),
            description: "The sewers crawl. Thin the rats out.".to_string(),
            quest_type: QuestType::Kill,
            target_name: "Rat".to_string(),
            target_count: 2,
            reward_xp: 250,
            reward_gold: 50,
        }],
        ..Default::default()
    };
    content::populate(&mut world.engine, &config);
    world.engine.world.spawn((
        Description {
            short: "Town Elder".to_string(),
            long: "A weathered elder watches the gate.".to_string(),
        },
        LandPosition {
            x: 0,
            y: 0,
            zone_id: "Earth".to_string(),
        },
        QuestGiver {
            quest_ids: vec!["quest_rat_cull".to_string()],
        },
    ));
    world
}

#[test]
fn accept_by_title_substring_from_a_present_giver() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);

    world.cmd("c1", "quest accept rat", 0);

    assert!(conn.saw("Quest Accepted: Rat Extermination"));
    let player = world.player("c1");
    let log = world.engine.world.get::<QuestLog>(player).unwrap();
    assert_eq!(log.quests.len(), 1);
    assert_eq!(log.quests[0].status, QuestStatus::InProgress);
    assert_eq!(log.quests[0].progress, 0);

    conn.clear();
    world.cmd("c1", "quest accept rat", 0);
    assert!(conn.saw("You already have that quest."));
}

#[test]
fn accepting_away_from_the_giver_fails() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 5, 5);

    world.cmd("c1", "quest accept rat", 0);

    assert!(conn.saw("No one here has that quest for you."));
    let player = world.player("c1");
    assert!(!world.engine.world.has::<QuestLog>(player));
}

#[test]
fn kills_advance_progress_and_complete_at_target_count() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);
    conn.clear();

    let player = world.player("c1");
    quest::on_mob_killed(&mut world.engine, player, "Rat");
    assert!(conn.saw("Quest Update: Rat Extermination (1/2)"));

    quest::on_mob_killed(&mut world.engine, player, "Rat");
    assert!(conn.saw("Quest Complete: Rat Extermination!"));

    let log = world.engine.world.get::<QuestLog>(player).unwrap();
    assert_eq!(log.quests[0].status, QuestStatus::Completed);
    assert_eq!(log.quests[0].progress, 2);
}

#[test]
fn kills_of_other_mobs_do_not_count() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);
    conn.clear();

    let player = world.player("c1");
    quest::on_mob_killed(&mut world.engine, player, "Martian Rover");

    let log = world.engine.world.get::<QuestLog>(player).unwrap();
    assert_eq!(log.quests[0].progress, 0);
    assert!(conn.lines().is_empty());
}

#[test]
fn vehicle_kills_credit_the_controlling_player() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);
    conn.clear();

    let player = world.player("c1");
    let drone = world.engine.world.spawn((Ship {
        name: "Drone".to_string(),
        hull: 10.0,
        max_hull: 10.0,
        shields: 0.0,
        max_shields: 0.0,
    },));
    world
        .engine
        .world
        .insert(player, Controlling { target: drone })
        .unwrap();

    quest::on_mob_killed(&mut world.engine, drone, "Rat");

    assert!(conn.saw("Quest Update: Rat Extermination (1/2)"));
    let log = world.engine.world.get::<QuestLog>(player).unwrap();
    assert_eq!(log.quests[0].progress, 1);
}

#[test]
fn turn_in_pays_rewards_and_runs_the_leveling_check() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);

    let player = world.player("c1");
    // Pre-load XP so the 250 reward crosses the level-1 threshold.
    world
        .engine
        .world
        .insert(
            player,
            Experience {
                value: 900,
                level: 1,
            },
        )
        .unwrap();
    let money_before = world.engine.world.get::<Money>(player).unwrap().amount;

    quest::on_mob_killed(&mut world.engine, player, "Rat");
    quest::on_mob_killed(&mut world.engine, player, "Rat");
    conn.clear();

    world.cmd("c1", "quest complete rat", 0);

    assert!(conn.saw("Quest Completed: Rat Extermination"));
    assert!(conn.saw("You gained 250 XP."));
    assert!(conn.saw("You gained 50 credits."));
    assert!(conn.saw("*** LEVEL UP! You are now level 2! ***"));

    let xp = world.engine.world.get::<Experience>(player).unwrap();
    assert_eq!(xp.value, 1150);
    assert_eq!(xp.level, 2);
    let money = world.engine.world.get::<Money>(player).unwrap();
    assert_eq!(money.amount, money_before + 50);

    let log = world.engine.world.get::<QuestLog>(player).unwrap();
    assert_eq!(log.quests[0].status, QuestStatus::TurnedIn);
}

#[test]
fn turn_in_requires_completion_first() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);
    conn.clear();

    world.cmd("c1", "quest complete rat", 0);
    assert!(conn.saw("You haven't completed the objectives yet."));
}

#[test]
fn turn_in_twice_is_rejected() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);

    let player = world.player("c1");
    quest::on_mob_killed(&mut world.engine, player, "Rat");
    quest::on_mob_killed(&mut world.engine, player, "Rat");
    world.cmd("c1", "quest complete rat", 0);
    conn.clear();

    world.cmd("c1", "quest complete rat", 0);
    assert!(conn.saw("You have already completed that quest."));
}

#[test]
fn quest_list_shows_status_and_progress() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);

    let player = world.player("c1");
    quest::on_mob_killed(&mut world.engine, player, "Rat");
    conn.clear();

    world.cmd("c1", "quest list", 0);
    assert!(conn.saw("--- Quest Log ---"));
    assert!(conn.saw("Rat Extermination: InProgress (1/2)"));
}

#[test]
fn killing_a_quest_target_through_combat_advances_the_log() {
    let mut world = quest_world();
    let conn = world.login_on_land("c1", "hero", "Earth", 0, 0);
    world.cmd("c1", "quest accept rat", 0);
    conn.clear();

    let player = world.player("c1");
    let rat = spawn_land_mob(&mut world.engine, "Rat", "Earth", 0, 0, 5);
    world
        .engine
        .world
        .insert(
            player,
            CombatState {
                target: rat,
                next_attack_at: 0,
            },
        )
        .unwrap();

    orrery_game::combat::run(&mut world.engine, 0);

    assert!(!world.engine.world.is_alive(rat));
    assert!(conn.saw("Quest Update: Rat Extermination (1/2)"));
}
