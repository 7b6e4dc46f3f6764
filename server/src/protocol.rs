//! Per-connection protocol handling
//!
//! This module interprets inbound client events against the session store
//! and decides what to send back. It is deliberately free of any socket
//! I/O: every handler returns a list of [`Outbound`] actions which the
//! network layer delivers, so the whole event table is testable with plain
//! function calls.
//!
//! Failure semantics: a bad player name is reported privately as a
//! `join_error`; everything else that fails a precondition (unknown
//! session, host-only event from a non-host, event from an unbound
//! connection) is silently dropped. Stale or racing client messages are
//! expected and harmless, so they are no-ops rather than faults.

use crate::draw;
use crate::session::SessionStore;
use log::{debug, info};
use rand::Rng;
use shared::{sanitize_name, ClientEvent, Player, ServerEvent, MAX_NUMBER};

/// Where an outbound event is delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Only to the connection whose event produced it.
    Private(ServerEvent),
    /// To every connection in the sender's session room, sender included.
    Room(ServerEvent),
}

/// State carried by one connection across its lifetime.
///
/// A connection starts unbound, binds to a session on `join_session`
/// (recording whether it is the host) and may additionally register a
/// player identity on `player_join`. The registered player id is owned by
/// this connection alone.
#[derive(Debug, Clone, Default)]
pub struct ConnContext {
    pub conn_id: u32,
    pub session_id: Option<String>,
    pub is_host: bool,
    pub player_id: Option<u32>,
}

impl ConnContext {
    pub fn new(conn_id: u32) -> Self {
        Self {
            conn_id,
            session_id: None,
            is_host: false,
            player_id: None,
        }
    }
}

/// Applies one inbound event and returns the deliveries it caused.
pub fn handle_event(
    store: &mut SessionStore,
    ctx: &mut ConnContext,
    event: ClientEvent,
    animation_delay_ms: u64,
    rng: &mut impl Rng,
) -> Vec<Outbound> {
    match event {
        ClientEvent::JoinSession {
            session_id,
            is_host,
        } => {
            let session = store.get_or_create(&session_id);
            let snapshot = session.clone();

            ctx.session_id = Some(session_id);
            ctx.is_host = is_host;

            vec![Outbound::Private(ServerEvent::SessionState(snapshot))]
        }

        ClientEvent::PlayerJoin { name, .. } => {
            // One player identity per connection.
            if ctx.player_id.is_some() {
                return Vec::new();
            }
            let Some(session) = bound_session(store, ctx) else {
                return Vec::new();
            };

            let name = match sanitize_name(&name) {
                Ok(name) => name,
                Err(message) => {
                    return vec![Outbound::Private(ServerEvent::JoinError {
                        message: message.to_string(),
                    })]
                }
            };

            let player = Player::new(ctx.conn_id, name);
            info!(
                "Player {} ({}) joined session {}",
                player.id, player.name, session.session_id
            );
            session.players.push(player.clone());
            ctx.player_id = Some(player.id);

            vec![
                Outbound::Room(ServerEvent::PlayerJoined(player.clone())),
                Outbound::Private(ServerEvent::PlayerRegistered {
                    player_id: player.id,
                }),
            ]
        }

        ClientEvent::PickNumber => {
            if !ctx.is_host {
                return Vec::new();
            }
            let Some(session) = bound_session(store, ctx) else {
                return Vec::new();
            };

            match draw::generate(&session.picked_numbers, rng) {
                Some(calculation) => {
                    session.picked_numbers.push(calculation.result);
                    debug!(
                        "Session {}: drew {} {} {} = {} ({} picked)",
                        session.session_id,
                        calculation.x,
                        calculation.operator.symbol(),
                        calculation.z,
                        calculation.result,
                        session.picked_numbers.len()
                    );

                    vec![Outbound::Room(ServerEvent::NumberPicked {
                        picked_numbers: session.picked_numbers.clone(),
                        remaining: MAX_NUMBER - session.picked_numbers.len() as u32,
                        animation_delay: animation_delay_ms,
                        calculation,
                    })]
                }
                None => vec![Outbound::Room(ServerEvent::GameComplete)],
            }
        }

        ClientEvent::StatusChange { status } => {
            let Some(player_id) = ctx.player_id else {
                return Vec::new();
            };
            let Some(session) = bound_session(store, ctx) else {
                return Vec::new();
            };
            let Some(player) = session.player_mut(player_id) else {
                return Vec::new();
            };

            player.status = status.clone();

            vec![Outbound::Room(ServerEvent::PlayerStatusChanged {
                player_id,
                name: player.name.clone(),
                status,
            })]
        }

        ClientEvent::ThemeChange { theme } => {
            if !ctx.is_host {
                return Vec::new();
            }
            let Some(session) = bound_session(store, ctx) else {
                return Vec::new();
            };

            session.theme = theme.clone();

            vec![Outbound::Room(ServerEvent::ThemeChanged { theme })]
        }

        ClientEvent::ResetGame => {
            if !ctx.is_host {
                return Vec::new();
            }
            let Some(session_id) = ctx.session_id.clone() else {
                return Vec::new();
            };
            if !store.reset_draws(&session_id) {
                return Vec::new();
            }

            vec![Outbound::Room(ServerEvent::GameReset)]
        }
    }
}

/// Cleans up after a closed connection. If it had registered a player the
/// room is told who left; otherwise nothing happens.
pub fn handle_disconnect(store: &mut SessionStore, ctx: &ConnContext) -> Vec<Outbound> {
    let Some(player_id) = ctx.player_id else {
        return Vec::new();
    };
    let Some(session_id) = ctx.session_id.as_deref() else {
        return Vec::new();
    };
    let Some(session) = store.get_mut(session_id) else {
        return Vec::new();
    };
    let Some(player) = session.remove_player(player_id) else {
        return Vec::new();
    };

    info!(
        "Player {} ({}) left session {}",
        player.id, player.name, session_id
    );

    vec![Outbound::Room(ServerEvent::PlayerLeft {
        player_id: player.id,
        name: player.name,
    })]
}

fn bound_session<'a>(
    store: &'a mut SessionStore,
    ctx: &ConnContext,
) -> Option<&'a mut shared::Session> {
    store.get_mut(ctx.session_id.as_deref()?)
}
