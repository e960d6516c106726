//! JSON-file-backed account store.
//!
//! Good enough durability for a small server: the whole account table is
//! rewritten on every save. The tick thread calls save synchronously, so
//! writes are already serialized; the mutex only guards against a torn
//! in-memory view.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use orrery_game::prelude::{Account, AccountStore};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct State {
    next_account_id: i64,
    next_item_id: i64,
    accounts: HashMap<String, Account>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_account_id: 1,
            next_item_id: 1,
            accounts: HashMap::new(),
        }
    }
}

pub struct FileStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let state = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("parsing account store {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => State::default(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading account store {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn flush(&self, state: &State) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing account store {}", self.path.display()))
    }
}

impl AccountStore for FileStore {
    fn load_by_name(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let state = self.state.lock().expect("account store poisoned");
        Ok(state.accounts.get(username).cloned())
    }

    fn create(&self, username: &str) -> anyhow::Result<Account> {
        let mut state = self.state.lock().expect("account store poisoned");
        let id = state.next_account_id;
        state.next_account_id += 1;
        let account = Account::starter(id, username);
        state.accounts.insert(username.to_string(), account.clone());
        self.flush(&state)?;
        Ok(account)
    }

    fn save(&self, mut account: Account) -> anyhow::Result<Account> {
        let mut state = self.state.lock().expect("account store poisoned");
        for item in &mut account.items {
            if item.id == 0 {
                item.id = state.next_item_id;
                state.next_item_id += 1;
            }
        }
        state
            .accounts
            .insert(account.username.clone(), account.clone());
        self.flush(&state)?;
        Ok(account)
    }
}
