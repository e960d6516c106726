//! Gameplay components.
//!
//! Capability is the *set* of components on an entity: an entity can fight
//! iff a weapon is reachable, is in space iff it has a [`SpacePosition`],
//! is carried iff it has a [`ContainedBy`]. Space and land positions are
//! mutually exclusive per entity, as are contained-by and any position on an
//! item. All gameplay timestamps are absolute milliseconds on the engine
//! clock (see `game_loop`).

use std::collections::HashMap;
use std::fmt;

use orrery_ecs::prelude::Entity;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Identity & relations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub short: String,
    pub long: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub connection_id: String,
}

/// The player entity is acting through another entity (a piloted ship).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controlling {
    pub target: Entity,
}

/// Back-relation from an item to whatever currently holds it. The holder
/// never keeps a forward list; contents are always found by query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainedBy {
    pub holder: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub capacity: u32,
}

/// Durable persistence row id for an owned item. Distinct from the entity
/// handle, which never leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbId(pub i64);

// ---------------------------------------------------------------------------
// Position -- two mutually exclusive topologies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpacePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub sector_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandPosition {
    pub x: i32,
    pub y: i32,
    pub zone_id: String,
}

/// A landable world; `zone_id` names the land grid the planet surfaces into.
#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    pub name: String,
    pub zone_id: String,
}

// ---------------------------------------------------------------------------
// Stats & combat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub name: String,
    pub hull: f64,
    pub max_hull: f64,
    pub shields: f64,
    pub max_shields: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub name: String,
    pub damage: i32,
    pub range: i32,
    pub cooldown_ms: u64,
    /// `None` until the weapon has fired once.
    pub last_fired_at: Option<u64>,
}

impl Weapon {
    /// Whether the weapon's cooldown has elapsed at `now`.
    pub fn is_ready(&self, now: u64) -> bool {
        match self.last_fired_at {
            Some(fired) => now.saturating_sub(fired) >= self.cooldown_ms,
            None => true,
        }
    }
}

/// Presence of this component *is* the Engaged combat state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatState {
    /// Must be liveness-checked before every use; the target can die between
    /// ticks or earlier in the same tick.
    pub target: Entity,
    pub next_attack_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggressive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corpse;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shopkeeper;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Experience {
    pub value: i32,
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Money {
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mana {
    pub current: i32,
    pub max: i32,
}

// ---------------------------------------------------------------------------
// Items & equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub value: i32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EquipSlot {
    Head,
    Chest,
    Legs,
    Feet,
    MainHand,
    OffHand,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::Head,
        EquipSlot::Chest,
        EquipSlot::Legs,
        EquipSlot::Feet,
        EquipSlot::MainHand,
        EquipSlot::OffHand,
    ];

    fn index(self) -> usize {
        match self {
            EquipSlot::Head => 0,
            EquipSlot::Chest => 1,
            EquipSlot::Legs => 2,
            EquipSlot::Feet => 3,
            EquipSlot::MainHand => 4,
            EquipSlot::OffHand => 5,
        }
    }

    /// Case-insensitive parse, for content config.
    pub fn parse(s: &str) -> Option<EquipSlot> {
        match s.to_ascii_lowercase().as_str() {
            "head" => Some(EquipSlot::Head),
            "chest" => Some(EquipSlot::Chest),
            "legs" => Some(EquipSlot::Legs),
            "feet" => Some(EquipSlot::Feet),
            "mainhand" => Some(EquipSlot::MainHand),
            "offhand" => Some(EquipSlot::OffHand),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equippable {
    pub slot: EquipSlot,
    pub armor_bonus: i32,
}

/// Per-slot equipped occupants. One item per slot; swapping returns the
/// previous occupant so the caller can unequip it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    slots: [Option<Entity>; 6],
}

impl Equipment {
    pub fn occupant(&self, slot: EquipSlot) -> Option<Entity> {
        self.slots[slot.index()]
    }

    /// Place `item` in `slot`, returning the displaced occupant if any.
    pub fn set(&mut self, slot: EquipSlot, item: Entity) -> Option<Entity> {
        self.slots[slot.index()].replace(item)
    }

    pub fn clear(&mut self, slot: EquipSlot) -> Option<Entity> {
        self.slots[slot.index()].take()
    }

    /// Occupied slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, Entity)> + '_ {
        EquipSlot::ALL
            .iter()
            .filter_map(|&slot| self.slots[slot.index()].map(|e| (slot, e)))
    }
}

/// Marker on an item that is currently worn or wielded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equipped {
    pub wearer: Entity,
    pub slot: EquipSlot,
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownSkills {
    pub skill_ids: Vec<String>,
}

/// Per-skill absolute ready times, keyed by skill id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillCooldowns {
    pub ready_at: HashMap<String, u64>,
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestStatus {
    NotStarted,
    InProgress,
    Completed,
    TurnedIn,
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestStatus::NotStarted => "NotStarted",
            QuestStatus::InProgress => "InProgress",
            QuestStatus::Completed => "Completed",
            QuestStatus::TurnedIn => "TurnedIn",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestState {
    pub quest_id: String,
    pub status: QuestStatus,
    pub progress: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestLog {
    pub quests: Vec<QuestState>,
}

/// NPC offering the listed quests for acceptance and turn-in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestGiver {
    pub quest_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_ready_respects_cooldown() {
        let mut weapon = Weapon {
            name: "Laser".into(),
            damage: 10,
            range: 100,
            cooldown_ms: 1000,
            last_fired_at: None,
        };
        assert!(weapon.is_ready(0), "never-fired weapon is ready");
        weapon.last_fired_at = Some(500);
        assert!(!weapon.is_ready(1400));
        assert!(weapon.is_ready(1500));
    }

    #[test]
    fn equipment_swap_returns_previous_occupant() {
        let mut equipment = Equipment::default();
        let sword = Entity::new(1, 0);
        let axe = Entity::new(2, 0);
        assert_eq!(equipment.set(EquipSlot::MainHand, sword), None);
        assert_eq!(equipment.set(EquipSlot::MainHand, axe), Some(sword));
        assert_eq!(equipment.occupant(EquipSlot::MainHand), Some(axe));
        assert_eq!(equipment.clear(EquipSlot::MainHand), Some(axe));
        assert_eq!(equipment.occupant(EquipSlot::MainHand), None);
    }

    #[test]
    fn equip_slot_parse_is_case_insensitive() {
        assert_eq!(EquipSlot::parse("mainhand"), Some(EquipSlot::MainHand));
        assert_eq!(EquipSlot::parse("MainHand"), Some(EquipSlot::MainHand));
        assert_eq!(EquipSlot::parse("HEAD"), Some(EquipSlot::Head));
        assert_eq!(EquipSlot::parse("belt"), None);
    }
}
