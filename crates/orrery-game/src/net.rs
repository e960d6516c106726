//! The connection surface the core consumes.
//!
//! The simulation never touches sockets or framing. A transport layer hands
//! the core something implementing [`Connection`]; inbound lines arrive as
//! command-queue records and disconnects as session-registry removals, so no
//! gameplay code ever runs on a connection's own task.

/// An abstract bidirectional line connection with a stable identity.
///
/// `send` must be non-blocking from the caller's perspective (the tick
/// thread calls it mid-simulation); implementations queue the line for
/// asynchronous delivery. `disconnect` asks the transport to close; the
/// transport then removes the session.
pub trait Connection: Send + Sync {
    /// Stable identity for the lifetime of the connection.
    fn id(&self) -> &str;

    /// Queue one response line for delivery.
    fn send(&self, line: &str);

    /// Ask the transport to close this connection.
    fn disconnect(&self);
}
