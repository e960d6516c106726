//! Read-only quest and skill definition tables.
//!
//! Definitions are loaded once during world generation and referenced by id
//! from per-entity state afterwards. Nothing outside this crate can mutate a
//! populated [`Catalog`]; the insert methods are crate-private and only the
//! content loader calls them.

use std::collections::HashMap;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum QuestType {
    #[default]
    Kill,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SkillType {
    #[default]
    Damage,
    Heal,
    Buff,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestDef {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub target_name: String,
    pub target_count: u32,
    pub reward_xp: i32,
    pub reward_gold: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub mana_cost: i32,
    #[serde(rename = "cooldown")]
    pub cooldown_ms: u64,
    /// Damage or heal amount, depending on the skill type.
    pub value: i32,
    pub range: i32,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Process-wide definition tables, keyed by id.
#[derive(Debug, Default)]
pub struct Catalog {
    quests: HashMap<String, QuestDef>,
    skills: HashMap<String, SkillDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_quest(&mut self, def: QuestDef) {
        self.quests.insert(def.id.clone(), def);
    }

    pub(crate) fn insert_skill(&mut self, def: SkillDef) {
        self.skills.insert(def.id.clone(), def);
    }

    pub fn quest(&self, id: &str) -> Option<&QuestDef> {
        self.quests.get(id)
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.get(id)
    }

    pub fn quest_count(&self) -> usize {
        self.quests.len()
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}
