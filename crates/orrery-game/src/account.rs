//! The persistence collaborator.
//!
//! The core saves and loads player snapshots through [`AccountStore`] and
//! expects eventual durability, nothing transactional. Accounts carry
//! position/location-kind, vitals, progression, money, and an owned-items
//! collection keyed by durable ids -- those ids are distinct from entity
//! handles and survive restarts; handles never leave the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// One persisted owned item. `id == 0` marks a row not yet assigned a
/// durable id; the store assigns one on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountItem {
    pub id: i64,
    pub name: String,
    pub value: i32,
    pub weight: f32,
}

/// A player account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Sector id when `in_space`, zone id otherwise.
    pub location_id: String,
    pub in_space: bool,
    pub current_health: i32,
    pub max_health: i32,
    pub experience: i32,
    pub level: i32,
    pub money: i32,
    pub items: Vec<AccountItem>,
}

impl Account {
    /// The freshly provisioned account every new name starts from: home
    /// sector origin, in space, level 1, 100 credits.
    pub fn starter(id: i64, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            x: 0,
            y: 0,
            z: 0,
            location_id: "Alpha".to_string(),
            in_space: true,
            current_health: 100,
            max_health: 100,
            experience: 0,
            level: 1,
            money: 100,
            items: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Load/create/save collaborator for player accounts.
///
/// `save` replaces the stored snapshot wholesale: rows present in
/// `account.items` are kept (rows with `id == 0` get fresh durable ids),
/// rows absent are deleted. The returned snapshot carries the assigned ids
/// in the same item order the caller submitted.
pub trait AccountStore: Send + Sync {
    fn load_by_name(&self, username: &str) -> anyhow::Result<Option<Account>>;
    fn create(&self, username: &str) -> anyhow::Result<Account>;
    fn save(&self, account: Account) -> anyhow::Result<Account>;
}

/// In-memory store backing tests and config-less servers.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, Account>>,
    next_account_id: AtomicI64,
    next_item_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            next_account_id: AtomicI64::new(1),
            next_item_id: AtomicI64::new(1),
        }
    }
}

impl AccountStore for MemoryStore {
    fn load_by_name(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let accounts = self.accounts.lock().expect("account store poisoned");
        Ok(accounts.get(username).cloned())
    }

    fn create(&self, username: &str) -> anyhow::Result<Account> {
        let id = self.next_account_id.fetch_add(1, Ordering::Relaxed);
        let account = Account::starter(id, username);
        let mut accounts = self.accounts.lock().expect("account store poisoned");
        accounts.insert(username.to_string(), account.clone());
        Ok(account)
    }

    fn save(&self, mut account: Account) -> anyhow::Result<Account> {
        for item in &mut account.items {
            if item.id == 0 {
                item.id = self.next_item_id.fetch_add(1, Ordering::Relaxed);
            }
        }
        let mut accounts = self.accounts.lock().expect("account store poisoned");
        accounts.insert(account.username.clone(), account.clone());
        Ok(account)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_load_roundtrip() {
        let store = MemoryStore::new();
        let created = store.create("kirk").unwrap();
        assert!(created.in_space);
        assert_eq!(created.money, 100);

        let loaded = store.load_by_name("kirk").unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(store.load_by_name("spock").unwrap().is_none());
    }

    #[test]
    fn save_assigns_durable_ids_in_submission_order() {
        let store = MemoryStore::new();
        let mut account = store.create("kirk").unwrap();
        account.items = vec![
            AccountItem {
                id: 0,
                name: "Blaster".into(),
                value: 50,
                weight: 2.0,
            },
            AccountItem {
                id: 0,
                name: "Health Potion".into(),
                value: 5,
                weight: 1.0,
            },
        ];

        let saved = store.save(account).unwrap();
        assert!(saved.items[0].id > 0);
        assert!(saved.items[1].id > saved.items[0].id);
        assert_eq!(saved.items[0].name, "Blaster");
    }

    #[test]
    fn save_drops_rows_no_longer_present() {
        let store = MemoryStore::new();
        let mut account = store.create("kirk").unwrap();
        account.items = vec![AccountItem {
            id: 0,
            name: "Rock".into(),
            value: 1,
            weight: 5.0,
        }];
        let mut saved = store.save(account).unwrap();

        saved.items.clear();
        let resaved = store.save(saved).unwrap();
        assert!(resaved.items.is_empty());
        let loaded = store.load_by_name("kirk").unwrap().unwrap();
        assert!(loaded.items.is_empty());
    }
}
