//! Login and player provisioning.

use tracing::warn;

use crate::components::{
    ContainedBy, DbId, Description, Experience, Health, Item, KnownSkills, LandPosition, Mana,
    Money, Player, Ship, SkillCooldowns, SpacePosition, Weapon,
};
use crate::engine::Engine;
use crate::session::{SessionState, SessionView};

/// The skills every character starts with.
const STARTER_SKILLS: [&str; 2] = ["skill_fireball", "skill_heal"];

/// Authenticate a connected session as `username`, auto-provisioning the
/// account on first login, and materialize the player into the world.
///
/// A store failure is reported to this one connection and leaves the shared
/// world untouched.
pub(crate) fn handle(engine: &mut Engine, view: &SessionView, username: &str) {
    let account = match engine.accounts.load_by_name(username) {
        Ok(Some(account)) => {
            view.conn.send(&format!("Welcome back, {username}!"));
            account
        }
        Ok(None) => match engine.accounts.create(username) {
            Ok(account) => {
                view.conn
                    .send(&format!("Account created. Welcome, {username}!"));
                account
            }
            Err(err) => {
                warn!(username, %err, "account creation failed");
                view.conn.send("Login failed. Try again later.");
                return;
            }
        },
        Err(err) => {
            warn!(username, %err, "account lookup failed");
            view.conn.send("Login failed. Try again later.");
            return;
        }
    };

    let player_entity = engine.world.spawn((
        Player {
            name: username.to_string(),
            connection_id: view.connection_id.clone(),
        },
        Description {
            short: username.to_string(),
            long: format!("This is {username}."),
        },
        Health {
            current: account.current_health,
            max: account.max_health,
        },
        Experience {
            value: account.experience,
            level: account.level,
        },
        Money {
            amount: account.money,
        },
        Mana {
            current: 100,
            max: 100,
        },
        KnownSkills {
            skill_ids: STARTER_SKILLS.iter().map(|s| s.to_string()).collect(),
        },
        SkillCooldowns::default(),
        Weapon {
            name: "Blaster".to_string(),
            damage: 10,
            range: 100,
            cooldown_ms: 1000,
            last_fired_at: None,
        },
    ));

    if account.in_space {
        engine
            .world
            .insert(
                player_entity,
                SpacePosition {
                    x: account.x as f64,
                    y: account.y as f64,
                    z: account.z as f64,
                    sector_id: account.location_id.clone(),
                },
            )
            .ok();
        engine
            .world
            .insert(
                player_entity,
                Ship {
                    name: format!("{username}'s Ship"),
                    hull: 100.0,
                    max_hull: 100.0,
                    shields: 100.0,
                    max_shields: 100.0,
                },
            )
            .ok();
    } else {
        engine
            .world
            .insert(
                player_entity,
                LandPosition {
                    x: account.x,
                    y: account.y,
                    zone_id: account.location_id.clone(),
                },
            )
            .ok();
    }

    // Re-create owned items from their persisted rows, keeping the durable
    // id on each so the next save updates instead of inserting.
    for item in &account.items {
        engine.world.spawn((
            Item {
                value: item.value,
                weight: item.weight,
            },
            Description {
                short: item.name.clone(),
                long: item.name.clone(),
            },
            ContainedBy {
                holder: player_entity,
            },
            DbId(item.id),
        ));
    }

    engine.sessions.update(&view.connection_id, |session| {
        session.state = SessionState::InGame;
        session.username = Some(username.to_string());
        session.account_id = Some(account.id);
        session.entity = Some(player_entity);
    });
}
