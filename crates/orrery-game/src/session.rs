//! Sessions and the inbound command queue.
//!
//! These are the only two structures touched by both connection tasks and
//! the tick thread, so both are lock-free: a sharded concurrent map for the
//! registry and a segment queue for commands. Everything else in the engine
//! is single-writer.
//!
//! Registry reads hand out materialized [`SessionView`] clones instead of
//! guards. The tick thread is free to send lines or walk the registry again
//! while holding a view; holding a shard guard across either would invite a
//! re-entrant deadlock.

use std::sync::Arc;

use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use orrery_ecs::prelude::Entity;

use crate::net::Connection;

// ---------------------------------------------------------------------------
// Command queue
// ---------------------------------------------------------------------------

/// One raw line from one connection, waiting for the tick thread.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub connection_id: String,
    pub line: String,
}

/// Unbounded multi-producer/single-consumer line queue.
///
/// Producers never block; unbounded growth is the availability trade-off --
/// connection reads are never stalled behind a slow tick.
#[derive(Default)]
pub struct CommandQueue {
    inner: SegQueue<InboundCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, connection_id: impl Into<String>, line: impl Into<String>) {
        self.inner.push(InboundCommand {
            connection_id: connection_id.into(),
            line: line.into(),
        });
    }

    pub fn pop(&self) -> Option<InboundCommand> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected but not authenticated; only `login` is accepted.
    Connected,
    InGame,
}

/// Per-connection state: auth stage, account linkage, controlled entity.
pub struct Session {
    pub conn: Arc<dyn Connection>,
    pub state: SessionState,
    pub username: Option<String>,
    pub account_id: Option<i64>,
    pub entity: Option<Entity>,
}

impl Session {
    fn new(conn: Arc<dyn Connection>) -> Self {
        Self {
            conn,
            state: SessionState::Connected,
            username: None,
            account_id: None,
            entity: None,
        }
    }
}

/// A lock-free snapshot of one session.
#[derive(Clone)]
pub struct SessionView {
    pub connection_id: String,
    pub conn: Arc<dyn Connection>,
    pub state: SessionState,
    pub username: Option<String>,
    pub account_id: Option<i64>,
    pub entity: Option<Entity>,
}

/// Concurrent map from connection identity to session state.
#[derive(Default)]
pub struct SessionRegistry {
    inner: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected session in the `Connected` state.
    pub fn insert(&self, conn: Arc<dyn Connection>) {
        self.inner
            .insert(conn.id().to_string(), Session::new(conn));
    }

    pub fn remove(&self, connection_id: &str) {
        self.inner.remove(connection_id);
    }

    /// Snapshot one session by connection id.
    pub fn view(&self, connection_id: &str) -> Option<SessionView> {
        self.inner
            .get(connection_id)
            .map(|entry| make_view(connection_id, &entry))
    }

    /// Mutate one session under its shard guard. The closure must not call
    /// back into the registry.
    pub fn update<R>(
        &self,
        connection_id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        self.inner.get_mut(connection_id).map(|mut entry| f(&mut entry))
    }

    /// Materialized snapshot of every session, for autosave sweeps and
    /// reverse lookups.
    pub fn views(&self) -> Vec<SessionView> {
        self.inner
            .iter()
            .map(|entry| make_view(entry.key(), entry.value()))
            .collect()
    }

    /// The session whose player entity is `entity`, if any.
    pub fn find_by_entity(&self, entity: Entity) -> Option<SessionView> {
        self.inner
            .iter()
            .find(|entry| entry.value().entity == Some(entity))
            .map(|entry| make_view(entry.key(), entry.value()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn make_view(connection_id: &str, session: &Session) -> SessionView {
    SessionView {
        connection_id: connection_id.to_string(),
        conn: Arc::clone(&session.conn),
        state: session.state,
        username: session.username.clone(),
        account_id: session.account_id,
        entity: session.entity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct NullConnection {
        id: String,
    }

    impl Connection for NullConnection {
        fn id(&self) -> &str {
            &self.id
        }
        fn send(&self, _line: &str) {}
        fn disconnect(&self) {}
    }

    fn conn(id: &str) -> Arc<dyn Connection> {
        Arc::new(NullConnection { id: id.to_string() })
    }

    #[test]
    fn queue_preserves_per_producer_order() {
        let queue = CommandQueue::new();
        queue.push("c1", "look");
        queue.push("c1", "move n");
        queue.push("c1", "attack rat");
        let drained: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|cmd| cmd.line)
            .collect();
        assert_eq!(drained, vec!["look", "move n", "attack rat"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn registry_create_lookup_remove() {
        let registry = SessionRegistry::new();
        registry.insert(conn("c1"));
        assert_eq!(registry.len(), 1);

        let view = registry.view("c1").unwrap();
        assert_eq!(view.state, SessionState::Connected);
        assert!(view.entity.is_none());

        registry.remove("c1");
        assert!(registry.view("c1").is_none());
    }

    #[test]
    fn update_promotes_session_to_in_game() {
        let registry = SessionRegistry::new();
        registry.insert(conn("c1"));
        let entity = Entity::new(4, 0);
        registry.update("c1", |s| {
            s.state = SessionState::InGame;
            s.username = Some("kirk".into());
            s.entity = Some(entity);
        });

        let view = registry.view("c1").unwrap();
        assert_eq!(view.state, SessionState::InGame);
        assert_eq!(view.entity, Some(entity));
        assert_eq!(registry.find_by_entity(entity).unwrap().connection_id, "c1");
    }
}
