//! World-content loading and population.
//!
//! Content is authored as a JSON document describing sectors (planets and
//! space mobs), zones (rooms with shopkeepers, land mobs, ground items),
//! and the quest/skill definition tables. It is loaded exactly once at
//! startup; a missing or malformed file logs a warning and the engine is
//! populated from a minimal built-in world instead, so the server always
//! starts.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use orrery_ecs::prelude::Entity;
use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{QuestDef, SkillDef, SkillType};
use crate::components::{
    Aggressive, ContainedBy, Description, EquipSlot, Equippable, Health, Item, LandPosition,
    Planet, QuestGiver, Shopkeeper, SpacePosition, Ship, Weapon,
};
use crate::engine::Engine;

// ---------------------------------------------------------------------------
// Config model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldConfig {
    pub sectors: Vec<SectorConfig>,
    pub zones: Vec<ZoneConfig>,
    pub quests: Vec<QuestDef>,
    pub skills: Vec<SkillDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectorConfig {
    pub id: String,
    pub planets: Vec<PlanetConfig>,
    pub mobs: Vec<SpaceMobConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanetConfig {
    pub name: String,
    pub zone_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpaceMobConfig {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub hull: f64,
    pub shields: f64,
    pub weapon: Option<WeaponConfig>,
    pub aggressive: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneConfig {
    pub id: String,
    pub rooms: Vec<RoomConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomConfig {
    pub x: i32,
    pub y: i32,
    pub description: String,
    pub long_description: String,
    pub shopkeeper: bool,
    pub mobs: Vec<LandMobConfig>,
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandMobConfig {
    pub name: String,
    pub health: i32,
    pub weapon: Option<WeaponConfig>,
    pub aggressive: bool,
    pub description: String,
    pub drops: Vec<ItemConfig>,
    pub quests: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemConfig {
    pub name: String,
    pub value: i32,
    pub weight: f32,
    pub weapon: Option<WeaponConfig>,
    pub equippable: Option<EquippableConfig>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquippableConfig {
    pub slot: String,
    pub armor_bonus: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaponConfig {
    pub name: String,
    pub damage: i32,
    pub range: i32,
    pub cooldown: u64,
}

impl WeaponConfig {
    fn to_component(&self) -> Weapon {
        Weapon {
            name: if self.name.is_empty() {
                "Weapon".to_string()
            } else {
                self.name.clone()
            },
            damage: self.damage,
            range: self.range,
            cooldown_ms: self.cooldown,
            last_fired_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load(path: &Path) -> anyhow::Result<WorldConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading world config {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing world config {}", path.display()))
}

/// Populate the engine from `path`, falling back to the built-in world if
/// the file is missing or malformed.
pub fn generate(engine: &mut Engine, path: &Path) {
    match load(path) {
        Ok(config) => {
            info!(path = %path.display(), "loading world config");
            populate(engine, &config);
        }
        Err(err) => {
            warn!(%err, "world config unavailable; using built-in defaults");
            populate(engine, &default_population());
        }
    }
}

/// Build the world and definition tables from a config. Definitions are
/// inserted first so quest givers can reference them.
pub fn populate(engine: &mut Engine, config: &WorldConfig) {
    for skill in &config.skills {
        if skill.id.is_empty() {
            continue;
        }
        engine.catalog.insert_skill(skill.clone());
    }
    for quest in &config.quests {
        if quest.id.is_empty() {
            continue;
        }
        engine.catalog.insert_quest(quest.clone());
    }

    for sector in &config.sectors {
        for planet in &sector.planets {
            engine.world.spawn((
                Planet {
                    name: planet.name.clone(),
                    zone_id: planet.zone_id.clone(),
                },
                SpacePosition {
                    x: planet.x,
                    y: planet.y,
                    z: planet.z,
                    sector_id: sector.id.clone(),
                },
                Description {
                    short: planet.name.clone(),
                    long: planet.description.clone(),
                },
            ));
        }

        for mob in &sector.mobs {
            let entity = engine.world.spawn((
                Ship {
                    name: mob.name.clone(),
                    hull: mob.hull,
                    max_hull: mob.hull,
                    shields: mob.shields,
                    max_shields: mob.shields,
                },
                SpacePosition {
                    x: mob.x,
                    y: mob.y,
                    z: mob.z,
                    sector_id: sector.id.clone(),
                },
                Description {
                    short: mob.name.clone(),
                    long: mob.description.clone(),
                },
            ));
            if let Some(weapon) = &mob.weapon {
                engine.world.insert(entity, weapon.to_component()).ok();
            }
            if mob.aggressive {
                engine.world.insert(entity, Aggressive).ok();
            }
        }
    }

    for zone in &config.zones {
        for room in &zone.rooms {
            let at = LandPosition {
                x: room.x,
                y: room.y,
                zone_id: zone.id.clone(),
            };

            // A room only becomes an entity when it has something to say.
            if !room.description.is_empty() || !room.long_description.is_empty() {
                engine.world.spawn((
                    Description {
                        short: room.description.clone(),
                        long: room.long_description.clone(),
                    },
                    at.clone(),
                ));
            }

            if room.shopkeeper {
                engine.world.spawn((
                    Description {
                        short: "Shopkeeper".to_string(),
                        long: "A friendly shopkeeper stands here.".to_string(),
                    },
                    at.clone(),
                    Shopkeeper,
                    Health {
                        current: 100,
                        max: 100,
                    },
                ));
            }

            for mob in &room.mobs {
                let entity = engine.world.spawn((
                    Description {
                        short: mob.name.clone(),
                        long: mob.description.clone(),
                    },
                    at.clone(),
                    Health {
                        current: mob.health,
                        max: mob.health,
                    },
                ));
                if let Some(weapon) = &mob.weapon {
                    engine.world.insert(entity, weapon.to_component()).ok();
                }
                if mob.aggressive {
                    engine.world.insert(entity, Aggressive).ok();
                }
                for drop in &mob.drops {
                    create_item(engine, drop, Some(entity), None);
                }
                if !mob.quests.is_empty() {
                    engine
                        .world
                        .insert(
                            entity,
                            QuestGiver {
                                quest_ids: mob.quests.clone(),
                            },
                        )
                        .ok();
                }
            }

            for item in &room.items {
                // Ground items carry a position, never a contained-by.
                create_item(engine, item, None, Some(at.clone()));
            }
        }
    }
}

fn create_item(
    engine: &mut Engine,
    config: &ItemConfig,
    holder: Option<Entity>,
    at: Option<LandPosition>,
) -> Entity {
    let entity = engine.world.spawn((
        Description {
            short: config.name.clone(),
            long: if config.description.is_empty() {
                config.name.clone()
            } else {
                config.description.clone()
            },
        },
        Item {
            value: config.value,
            weight: config.weight,
        },
    ));

    if let Some(at) = at {
        engine.world.insert(entity, at).ok();
    } else if let Some(holder) = holder {
        engine.world.insert(entity, ContainedBy { holder }).ok();
    }

    if let Some(weapon) = &config.weapon {
        engine.world.insert(entity, weapon.to_component()).ok();
    }
    if let Some(equippable) = &config.equippable {
        if let Some(slot) = EquipSlot::parse(&equippable.slot) {
            engine
                .world
                .insert(
                    entity,
                    Equippable {
                        slot,
                        armor_bonus: equippable.armor_bonus,
                    },
                )
                .ok();
        } else {
            warn!(item = %config.name, slot = %equippable.slot, "unknown equip slot");
        }
    }

    entity
}

// ---------------------------------------------------------------------------
// Built-in fallback world
// ---------------------------------------------------------------------------

/// The minimal world used when no config is available: the Alpha sector
/// with Earth, Mars and a pirate, a small Earth surface with a shop, an
/// elder offering a rat cull, and the starter skills.
pub fn default_population() -> WorldConfig {
    WorldConfig {
        sectors: vec![SectorConfig {
            id: "Alpha".into(),
            planets: vec![
                PlanetConfig {
                    name: "Earth".into(),
                    zone_id: "Earth".into(),
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                    description: "The blue marble. Home of humanity.".into(),
                },
                PlanetConfig {
                    name: "Mars".into(),
                    zone_id: "Mars".into(),
                    x: 50.0,
                    y: 0.0,
                    z: 0.0,
                    description: "The red planet. Dusty and cold.".into(),
                },
            ],
            mobs: vec![SpaceMobConfig {
                name: "Pirate Raider".into(),
                x: 20.0,
                y: 20.0,
                z: 0.0,
                hull: 50.0,
                shields: 20.0,
                weapon: Some(WeaponConfig {
                    name: "Laser Cannon".into(),
                    damage: 5,
                    range: 50,
                    cooldown: 2000,
                }),
                aggressive: true,
                description: "A rusty pirate ship looking for trouble.".into(),
            }],
        }],
        zones: vec![
            ZoneConfig {
                id: "Earth".into(),
                rooms: vec![
                    RoomConfig {
                        x: 0,
                        y: 0,
                        description: "Landing Field".into(),
                        long_description: "A scorched landing field at the edge of town.".into(),
                        shopkeeper: true,
                        mobs: vec![LandMobConfig {
                            name: "Town Elder".into(),
                            health: 100,
                            description: "A weathered elder watches the gate.".into(),
                            quests: vec!["quest_rat_cull".into()],
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                    RoomConfig {
                        x: 0,
                        y: 1,
                        mobs: vec![LandMobConfig {
                            name: "Rat".into(),
                            health: 20,
                            weapon: Some(WeaponConfig {
                                name: "Teeth".into(),
                                damage: 2,
                                range: 1,
                                cooldown: 1000,
                            }),
                            aggressive: true,
                            description: "A large sewer rat.".into(),
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                ],
            },
            ZoneConfig {
                id: "Mars".into(),
                rooms: vec![RoomConfig {
                    x: 5,
                    y: 5,
                    mobs: vec![LandMobConfig {
                        name: "Martian Rover".into(),
                        health: 50,
                        weapon: Some(WeaponConfig {
                            name: "Drill".into(),
                            damage: 8,
                            range: 2,
                            cooldown: 1500,
                        }),
                        aggressive: true,
                        description: "An old rover, malfunctioning and hostile.".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
            },
        ],
        quests: vec![QuestDef {
            id: "quest_rat_cull".into(),
            title: "Rat Extermination".into(),
            description: "The sewers crawl. Thin the rats out.".into(),
            target_name: "Rat".into(),
            target_count: 3,
            reward_xp: 250,
            reward_gold: 50,
            ..Default::default()
        }],
        skills: vec![
            SkillDef {
                id: "skill_fireball".into(),
                name: "Fireball".into(),
                description: "A searing bolt of flame.".into(),
                skill_type: SkillType::Damage,
                mana_cost: 20,
                cooldown_ms: 3000,
                value: 25,
                range: 10,
            },
            SkillDef {
                id: "skill_heal".into(),
                name: "Heal".into(),
                description: "Knit flesh and bone.".into(),
                skill_type: SkillType::Heal,
                mana_cost: 15,
                cooldown_ms: 5000,
                value: 20,
                range: 0,
            },
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
