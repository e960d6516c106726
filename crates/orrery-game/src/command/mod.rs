//! The command interpreter.
//!
//! `apply` turns one raw line from one session into world mutations and
//! response lines: tokenize on whitespace, dispatch on the lowercased first
//! token, route the rest to the owning command family. Unknown verbs and
//! every user-input failure produce a short rejection line and zero world
//! mutation; the world never swallows a command silently.
//!
//! Before authentication only `login <name>` is accepted. Every
//! authenticated command first resolves the *acting entity* -- the session's
//! own entity, or the vehicle named by its controlling relation -- and all
//! effects apply to it.

pub mod attack;
pub mod items;
pub mod login;
pub mod movement;
pub mod persist;
pub mod quests;
pub mod skills;
pub mod space;
pub mod trade;

use std::sync::Arc;

use orrery_ecs::prelude::Entity;
use tracing::warn;

use crate::components::{ContainedBy, Description, Equippable, Equipped, Item, LandPosition};
use crate::engine::Engine;
use crate::net::Connection;
use crate::session::SessionState;

/// Everything a command handler needs about the issuing session.
pub(crate) struct Ctx {
    pub conn: Arc<dyn Connection>,
    /// The session's player entity (not the acting entity).
    pub entity: Entity,
    pub username: String,
}

impl Ctx {
    pub fn send(&self, line: &str) {
        self.conn.send(line);
    }
}

/// Apply one raw command line for the session behind `connection_id` at
/// simulation time `now`.
pub fn apply(engine: &mut Engine, connection_id: &str, line: &str, now: u64) -> anyhow::Result<()> {
    // The session can vanish between enqueue and drain (disconnect races
    // the tick); a missing session simply drops the line.
    let Some(view) = engine.sessions.view(connection_id) else {
        return Ok(());
    };

    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    let verb = parts[0].to_ascii_lowercase();

    if view.state == SessionState::Connected {
        if verb == "login" && parts.len() > 1 {
            login::handle(engine, &view, parts[1]);
        } else {
            view.conn.send("Please login first: login <username>");
        }
        return Ok(());
    }

    let Some(entity) = view.entity else {
        return Ok(());
    };
    let ctx = Ctx {
        conn: Arc::clone(&view.conn),
        entity,
        username: view.username.clone().unwrap_or_default(),
    };

    match verb.as_str() {
        "move" | "n" | "s" | "e" | "w" | "u" | "d" => {
            let direction = if verb == "move" {
                parts.get(1).copied().unwrap_or("move")
            } else {
                verb.as_str()
            };
            movement::handle_move(engine, &ctx, direction);
        }
        "look" | "l" => movement::handle_look(engine, &ctx),
        "get" | "take" | "grab" => match rest(&parts, 1) {
            Some(arg) => items::handle_get(engine, &ctx, &arg),
            None => ctx.send("Get what?"),
        },
        "loot" => match rest(&parts, 1) {
            Some(arg) => items::handle_loot(engine, &ctx, &arg),
            None => ctx.send("Loot what?"),
        },
        "inventory" | "i" => items::handle_inventory(engine, &ctx),
        "drop" => match rest(&parts, 1) {
            Some(arg) => items::handle_drop(engine, &ctx, &arg),
            None => ctx.send("Drop what?"),
        },
        "equip" | "wear" | "wield" => match rest(&parts, 1) {
            Some(arg) => items::handle_equip(engine, &ctx, &arg),
            None => ctx.send("Equip what?"),
        },
        "unequip" | "remove" => match rest(&parts, 1) {
            Some(arg) => items::handle_unequip(engine, &ctx, &arg),
            None => ctx.send("Unequip what?"),
        },
        "quest" | "quests" => quests::handle(engine, &ctx, &parts),
        "attack" | "fire" => match rest(&parts, 1) {
            Some(arg) => attack::handle_attack(engine, &ctx, &arg, now),
            None => ctx.send("Attack what?"),
        },
        "cast" | "use" => match rest(&parts, 1) {
            Some(arg) => skills::handle_cast(engine, &ctx, &arg, now),
            None => ctx.send("Cast what?"),
        },
        "stop" => attack::handle_stop(engine, &ctx),
        "land" => match rest(&parts, 1) {
            Some(arg) => space::handle_land(engine, &ctx, &arg),
            None => ctx.send("Land on what?"),
        },
        "launch" => space::handle_launch(engine, &ctx),
        "score" | "status" => trade::handle_score(engine, &ctx),
        "buy" => match rest(&parts, 1) {
            Some(arg) => trade::handle_buy(engine, &ctx, &arg),
            None => ctx.send("Buy what?"),
        },
        "sell" => match rest(&parts, 1) {
            Some(arg) => trade::handle_sell(engine, &ctx, &arg),
            None => ctx.send("Sell what?"),
        },
        "save" => match persist::save_session(engine, &view) {
            Ok(()) => ctx.send("Saved."),
            Err(err) => {
                warn!(connection = %connection_id, %err, "save failed");
                ctx.send("Save failed; your progress may not persist.");
            }
        },
        "help" => ctx.send(
            "Commands: look, move <direction>, attack <target>, land <planet>, launch, \
             score, buy <item>, sell <item>, stop, quit",
        ),
        "quit" => {
            if let Err(err) = persist::save_session(engine, &view) {
                warn!(connection = %connection_id, %err, "save on quit failed");
                ctx.send("Save failed; your progress may not persist.");
            }
            ctx.send("Goodbye.");
            ctx.conn.disconnect();
        }
        _ => ctx.send("Unknown command."),
    }

    Ok(())
}

/// The argument tail starting at `from`, or `None` when absent.
fn rest(parts: &[&str], from: usize) -> Option<String> {
    if parts.len() > from {
        Some(parts[from..].join(" "))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Shared matching helpers
// ---------------------------------------------------------------------------

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn same_land_spot(a: &LandPosition, b: &LandPosition) -> bool {
    a.zone_id == b.zone_id && a.x == b.x && a.y == b.y
}

/// First carried item whose short description matches `name` (substring,
/// case-insensitive), honoring the caller's equip filters.
pub(crate) fn find_carried_item(
    engine: &Engine,
    holder: Entity,
    name: &str,
    require_equippable: bool,
    exclude_equipped: bool,
) -> Option<Entity> {
    let carried = engine
        .world
        .query()
        .with::<Item>()
        .with::<ContainedBy>()
        .with::<Description>()
        .entities();

    for item in carried {
        if engine.world.get::<ContainedBy>(item).map(|c| c.holder) != Some(holder) {
            continue;
        }
        if require_equippable && !engine.world.has::<Equippable>(item) {
            continue;
        }
        if exclude_equipped && engine.world.has::<Equipped>(item) {
            continue;
        }
        let Some(desc) = engine.world.get::<Description>(item) else {
            continue;
        };
        if contains_ignore_case(&desc.short, name) {
            return Some(item);
        }
    }
    None
}
