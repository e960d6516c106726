//! Orrery server binary.
//!
//! Wires the pieces together and runs the two halves of the concurrency
//! model: a tokio runtime with one task per connection (blocking line reads
//! into the command queue, channel-fed writes back out), and one dedicated
//! OS thread running the game loop as the world's single writer. Ctrl-C
//! stops accepting, flips the loop's shutdown flag, and joins it at the
//! next tick boundary.
//!
//! Configuration comes from the environment:
//! `ORRERY_BIND` (default `0.0.0.0:4000`), `ORRERY_WORLD`
//! (default `world.json`), `ORRERY_ACCOUNTS` (default `accounts.json`).

mod store;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orrery_game::content;
use orrery_game::prelude::*;

enum Outbound {
    Line(String),
    Close,
}

/// The transport half of a connection: the stable id the core keys on and
/// a channel into the writer task.
struct TcpConnection {
    id: String,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Connection for TcpConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, line: &str) {
        // Unbounded send: the tick thread never blocks on a slow client.
        let _ = self.tx.send(Outbound::Line(line.to_string()));
    }

    fn disconnect(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("ORRERY_BIND").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let world_path = std::env::var("ORRERY_WORLD").unwrap_or_else(|_| "world.json".to_string());
    let accounts_path =
        std::env::var("ORRERY_ACCOUNTS").unwrap_or_else(|_| "accounts.json".to_string());

    let sessions = Arc::new(SessionRegistry::new());
    let queue = Arc::new(CommandQueue::new());
    let accounts = Arc::new(store::FileStore::open(Path::new(&accounts_path))?);

    let mut engine = Engine::new(Arc::clone(&sessions), accounts);
    content::generate(&mut engine, Path::new(&world_path));

    let mut game_loop = GameLoop::new(engine, Arc::clone(&queue), LoopConfig::default());
    let shutdown = game_loop.shutdown_handle();
    let loop_thread = std::thread::Builder::new()
        .name("game-loop".to_string())
        .spawn(move || game_loop.run())
        .context("spawning game loop thread")?;

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(%bind, "listening");

    let mut next_conn: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        next_conn += 1;
                        let connection_id = format!("{addr}#{next_conn}");
                        tokio::spawn(handle_connection(
                            stream,
                            connection_id,
                            Arc::clone(&sessions),
                            Arc::clone(&queue),
                        ));
                    }
                    Err(err) => warn!(%err, "accept failed"),
                }
            }
        }
    }

    info!("shutting down");
    shutdown.store(true, Ordering::Relaxed);
    if loop_thread.join().is_err() {
        warn!("game loop thread panicked");
    }
    Ok(())
}

/// One task per connection: read newline-delimited commands into the queue,
/// drain the outbound channel back to the socket. Gameplay never runs here.
async fn handle_connection(
    stream: TcpStream,
    connection_id: String,
    sessions: Arc<SessionRegistry>,
    queue: Arc<CommandQueue>,
) {
    let (reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = Arc::new(TcpConnection {
        id: connection_id.clone(),
        tx,
    });

    sessions.insert(conn.clone());
    info!(connection = %connection_id, "connected");
    conn.send("Welcome to Orrery. login <name> to begin.");

    let writer_task = tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Line(line) => {
                    if writer.write_all(line.as_bytes()).await.is_err()
                        || writer.write_all(b"\r\n").await.is_err()
                    {
                        break;
                    }
                }
                Outbound::Close => break,
            }
        }
        let _ = writer.shutdown().await;
    });

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => queue.push(connection_id.clone(), line),
            Ok(None) | Err(_) => break,
        }
    }

    sessions.remove(&connection_id);
    conn.disconnect();
    let _ = writer_task.await;
    info!(connection = %connection_id, "disconnected");
}
