//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use orrery_game::command;
use orrery_game::prelude::*;

/// A connection double that records every outbound line.
pub struct RecordingConnection {
    id: String,
    lines: Mutex<Vec<String>>,
    disconnected: AtomicBool,
}

impl RecordingConnection {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            lines: Mutex::new(Vec::new()),
            disconnected: AtomicBool::new(false),
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Whether any recorded line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Relaxed)
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn disconnect(&self) {
        self.disconnected.store(true, Ordering::Relaxed);
    }
}

/// An engine plus the concurrent collaborators, pre-wired like the server
/// does it.
pub struct TestWorld {
    pub engine: Engine,
    pub sessions: Arc<SessionRegistry>,
    pub accounts: Arc<MemoryStore>,
}

impl TestWorld {
    /// An empty world; tests spawn exactly what they need.
    pub fn new() -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let accounts = Arc::new(MemoryStore::new());
        let engine = Engine::new(
            Arc::clone(&sessions),
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
        );
        Self {
            engine,
            sessions,
            accounts,
        }
    }

    /// Register a connection, as the transport layer would on accept.
    pub fn connect(&self, connection_id: &str) -> Arc<RecordingConnection> {
        let conn = RecordingConnection::new(connection_id);
        self.sessions.insert(conn.clone());
        conn
    }

    /// Apply one command line at simulation time `now`.
    pub fn cmd(&mut self, connection_id: &str, line: &str, now: u64) {
        command::apply(&mut self.engine, connection_id, line, now).unwrap();
    }

    /// Connect and log in, returning the connection double.
    pub fn login(&mut self, connection_id: &str, username: &str) -> Arc<RecordingConnection> {
        let conn = self.connect(connection_id);
        self.cmd(connection_id, &format!("login {username}"), 0);
        conn
    }

    /// Pre-provision an account on land, then log in.
    pub fn login_on_land(
        &mut self,
        connection_id: &str,
        username: &str,
        zone: &str,
        x: i32,
        y: i32,
    ) -> Arc<RecordingConnection> {
        let mut account = self.accounts.create(username).unwrap();
        account.in_space = false;
        account.location_id = zone.to_string();
        account.x = x;
        account.y = y;
        self.accounts.save(account).unwrap();
        self.login(connection_id, username)
    }

    /// The player entity behind a logged-in connection.
    pub fn player(&self, connection_id: &str) -> Entity {
        self.sessions
            .view(connection_id)
            .and_then(|v| v.entity)
            .expect("session not in game")
    }
}

/// A land mob with the given vitals at a spot.
pub fn spawn_land_mob(
    engine: &mut Engine,
    name: &str,
    zone: &str,
    x: i32,
    y: i32,
    health: i32,
) -> Entity {
    engine.world.spawn((
        Description {
            short: name.to_string(),
            long: format!("{name} is here."),
        },
        LandPosition {
            x,
            y,
            zone_id: zone.to_string(),
        },
        Health {
            current: health,
            max: health,
        },
    ))
}
